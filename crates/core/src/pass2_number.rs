//! Pass 2: Section numbering -- assign raw hierarchical numbers the way the
//! host pipeline does, then rewrite appendix subtrees to use letters.
//!
//! Paragraph numbers are never stored; they are derived from the final
//! section number and the paragraph's sequence whenever they are rendered.

use crate::ast::{Document, DocumentId, Node, Section};
use crate::error::IndexError;
use crate::registry::ParagraphInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The largest appendix number that still maps to a letter.
pub const MAX_APPENDICES: u32 = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberPart {
    Int(u32),
    Letter(char),
}

impl fmt::Display for NumberPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberPart::Int(n) => write!(f, "{}", n),
            NumberPart::Letter(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionNumber(pub Vec<NumberPart>);

impl SectionNumber {
    pub fn from_ints(parts: &[u32]) -> Self {
        SectionNumber(parts.iter().map(|n| NumberPart::Int(*n)).collect())
    }
}

impl fmt::Display for SectionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

/// One independent numbering tree: chapters, then an optional appendix subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingRoot {
    #[serde(default)]
    pub chapters: Vec<DocumentId>,
    #[serde(default)]
    pub appendices: Vec<DocumentId>,
}

/// Section numbers keyed by document, then by section anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionNumbers {
    by_document: BTreeMap<DocumentId, BTreeMap<String, SectionNumber>>,
}

impl SectionNumbers {
    pub fn get(&self, document: &str, anchor: &str) -> Option<&SectionNumber> {
        self.by_document.get(document).and_then(|m| m.get(anchor))
    }

    pub fn insert(&mut self, document: &str, anchor: &str, number: SectionNumber) {
        self.by_document
            .entry(document.to_owned())
            .or_default()
            .insert(anchor.to_owned(), number);
    }
}

/// Display number of a paragraph: `<section number>:<sequence>`.
pub fn paragraph_number(
    document: &str,
    info: &ParagraphInfo,
    numbers: &SectionNumbers,
) -> Result<String, IndexError> {
    let section = numbers
        .get(document, &info.section_anchor)
        .ok_or_else(|| IndexError::MissingSectionNumber {
            document: document.to_owned(),
            anchor: info.section_anchor.clone(),
        })?;
    Ok(format!("{}:{}", section, info.sequence))
}

/// Host-equivalent numbering: every tree numbers its top-level sections
/// from 1 in document order, nesting adds a component.
pub fn assign_raw_numbers(
    roots: &[NumberingRoot],
    documents: &BTreeMap<DocumentId, Document>,
) -> Result<SectionNumbers, IndexError> {
    let mut numbers = SectionNumbers::default();
    for root in roots {
        for tree in [&root.chapters, &root.appendices] {
            let mut counter = 0u32;
            for name in tree {
                let doc = documents
                    .get(name)
                    .ok_or_else(|| IndexError::UnknownDocument {
                        document: name.clone(),
                    })?;
                for node in &doc.children {
                    if let Node::Section(section) = node {
                        counter += 1;
                        number_section(name, section, vec![counter], &mut numbers);
                    }
                }
            }
        }
    }
    Ok(numbers)
}

fn number_section(
    document: &str,
    section: &Section,
    prefix: Vec<u32>,
    numbers: &mut SectionNumbers,
) {
    numbers.insert(document, &section.anchor(), SectionNumber::from_ints(&prefix));
    let mut child = 0u32;
    for node in &section.children {
        walk_nested(document, node, &prefix, &mut child, numbers);
    }
}

fn walk_nested(
    document: &str,
    node: &Node,
    prefix: &[u32],
    counter: &mut u32,
    numbers: &mut SectionNumbers,
) {
    if let Node::Section(section) = node {
        *counter += 1;
        let mut number = prefix.to_vec();
        number.push(*counter);
        number_section(document, section, number, numbers);
    } else {
        for c in node.children() {
            walk_nested(document, c, prefix, counter, numbers);
        }
    }
}

/// Rewrite the first component of every number: chapters continue from
/// the previous root's highest chapter, appendices become letters
/// continuing from the previous root's highest appendix.
pub fn rewrite_appendices(
    roots: &[NumberingRoot],
    numbers: &mut SectionNumbers,
) -> Result<(), IndexError> {
    let mut chapter_offset = 0u32;
    let mut appendix_offset = 0u32;

    for root in roots {
        let mut chapter_max = chapter_offset;
        let mut appendix_max = appendix_offset;

        for name in &root.chapters {
            for number in document_numbers(numbers, name) {
                if let Some(NumberPart::Int(first)) = number.0.first().copied() {
                    let n = chapter_offset + first;
                    number.0[0] = NumberPart::Int(n);
                    chapter_max = chapter_max.max(n);
                }
            }
        }

        for name in &root.appendices {
            for number in document_numbers(numbers, name) {
                if let Some(NumberPart::Int(first)) = number.0.first().copied() {
                    let n = appendix_offset + first;
                    if n > MAX_APPENDICES {
                        return Err(IndexError::AppendixOverflow {
                            document: name.clone(),
                            number: n,
                        });
                    }
                    number.0[0] = NumberPart::Letter(appendix_letter(n));
                    appendix_max = appendix_max.max(n);
                }
            }
        }

        chapter_offset = chapter_max;
        appendix_offset = appendix_max;
    }

    tracing::info!(
        chapters = chapter_offset,
        appendices = appendix_offset,
        "section numbers assigned"
    );
    Ok(())
}

fn document_numbers<'a>(
    numbers: &'a mut SectionNumbers,
    document: &str,
) -> impl Iterator<Item = &'a mut SectionNumber> {
    numbers
        .by_document
        .get_mut(document)
        .into_iter()
        .flat_map(|m| m.values_mut())
}

fn appendix_letter(n: u32) -> char {
    // n is in 1..=26, checked by the caller
    char::from(b'A' + (n - 1) as u8)
}

/// Run both numbering steps.
pub fn number_sections(
    roots: &[NumberingRoot],
    documents: &BTreeMap<DocumentId, Document>,
) -> Result<SectionNumbers, IndexError> {
    let mut numbers = assign_raw_numbers(roots, documents)?;
    rewrite_appendices(roots, &mut numbers)?;
    Ok(numbers)
}
