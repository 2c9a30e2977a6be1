//! Per-kind behaviour: how definitions of each kind are collected,
//! anchored and rendered.
//!
//! [`Kind`] is a closed set; [`behavior`] maps each variant to the unit type
//! implementing [`KindBehavior`] for it.

use crate::ast::{Kind, Node};
use crate::error::IndexError;
use crate::pass2_number::{paragraph_number, SectionNumbers};
use crate::registry::{DefinitionItem, ItemData, ParagraphInfo};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

pub const PARAGRAPH_ID_CLASS: &str = "spec-paragraph-id";
pub const MISSING_REF_CLASS: &str = "spec-missing-ref";

/// The section enclosing a definition marker.
#[derive(Debug, Clone)]
pub struct SectionSite {
    /// Stable id, when the section carries one with the project prefix
    pub id: Option<String>,
    pub anchor: String,
}

/// A definition marker found while walking a document, with the context
/// that kinds need to build their item.
#[derive(Debug, Clone)]
pub struct DefinitionSite {
    pub id: String,
    pub text: String,
    pub section: Option<SectionSite>,
    /// Plain text of the enclosing paragraph, or of the marker itself
    pub block_text: String,
}

pub trait KindBehavior: Sync {
    fn kind(&self) -> Kind;

    /// Build items for the sites of this kind, in document order.
    fn collect(
        &self,
        document: &str,
        sites: &[DefinitionSite],
    ) -> Result<Vec<DefinitionItem>, IndexError> {
        Ok(sites
            .iter()
            .map(|site| DefinitionItem {
                kind: self.kind(),
                id: site.id.clone(),
                document: document.to_owned(),
                text: site.text.clone(),
                data: ItemData::Plain,
            })
            .collect())
    }

    fn anchor(&self, item: &DefinitionItem) -> String;

    fn display_name(
        &self,
        item: &DefinitionItem,
        _numbers: &SectionNumbers,
    ) -> Result<String, IndexError> {
        Ok(item.text.clone())
    }

    fn include_in_search(&self) -> bool {
        true
    }

    /// Node replacing the definition marker.
    fn render_definition(
        &self,
        item: &DefinitionItem,
        numbers: &SectionNumbers,
    ) -> Result<Node, IndexError>;

    /// Node shown as the body of a reference; `item` is `None` when the
    /// target is missing.
    fn render_reference(
        &self,
        display: &str,
        item: Option<&DefinitionItem>,
        numbers: &SectionNumbers,
    ) -> Result<Node, IndexError>;
}

pub fn behavior(kind: Kind) -> &'static dyn KindBehavior {
    match kind {
        Kind::Paragraph => &Paragraphs,
        Kind::GrammarCategory => &GrammarCategories,
        Kind::GlossaryTerm => &GlossaryTerms,
        Kind::CodeConstruct => &CodeConstructs,
    }
}

fn anchored(anchor: String, class: &str, children: Vec<Node>) -> Node {
    Node::Inline {
        ids: vec![anchor],
        classes: vec![class.to_owned()],
        children,
    }
}

// ──────────────────────────────────────────────
// Paragraphs
// ──────────────────────────────────────────────

pub struct Paragraphs;

/// Lowercase hex SHA-256 of a paragraph's plain text.
pub fn content_checksum(plaintext: &str) -> String {
    format!("{:x}", Sha256::digest(plaintext.as_bytes()))
}

impl KindBehavior for Paragraphs {
    fn kind(&self) -> Kind {
        Kind::Paragraph
    }

    fn collect(
        &self,
        document: &str,
        sites: &[DefinitionSite],
    ) -> Result<Vec<DefinitionItem>, IndexError> {
        let mut sequences: HashMap<String, u32> = HashMap::new();
        let mut items = Vec::with_capacity(sites.len());
        for site in sites {
            let section = site
                .section
                .as_ref()
                .ok_or_else(|| IndexError::ParagraphOutsideSection {
                    id: site.id.clone(),
                    document: document.to_owned(),
                })?;
            let section_id = section
                .id
                .clone()
                .ok_or_else(|| IndexError::SectionWithoutId {
                    id: site.id.clone(),
                    document: document.to_owned(),
                })?;
            let sequence = sequences.entry(section_id.clone()).or_insert(0);
            *sequence += 1;
            items.push(DefinitionItem {
                kind: Kind::Paragraph,
                id: site.id.clone(),
                document: document.to_owned(),
                text: site.text.clone(),
                data: ItemData::Paragraph(ParagraphInfo {
                    section_id,
                    section_anchor: section.anchor.clone(),
                    sequence: *sequence,
                    content_checksum: content_checksum(&site.block_text),
                }),
            });
        }
        Ok(items)
    }

    fn anchor(&self, item: &DefinitionItem) -> String {
        item.id.clone()
    }

    fn display_name(
        &self,
        item: &DefinitionItem,
        numbers: &SectionNumbers,
    ) -> Result<String, IndexError> {
        match item.paragraph() {
            Some(info) => Ok(format!(
                "{} {}",
                paragraph_number(&item.document, info, numbers)?,
                info.content_checksum
            )),
            None => Ok(item.text.clone()),
        }
    }

    fn include_in_search(&self) -> bool {
        false
    }

    fn render_definition(
        &self,
        item: &DefinitionItem,
        numbers: &SectionNumbers,
    ) -> Result<Node, IndexError> {
        let number = number_of(item, numbers)?;
        Ok(anchored(
            self.anchor(item),
            PARAGRAPH_ID_CLASS,
            vec![Node::text(number)],
        ))
    }

    fn render_reference(
        &self,
        display: &str,
        item: Option<&DefinitionItem>,
        numbers: &SectionNumbers,
    ) -> Result<Node, IndexError> {
        let text = match item {
            Some(item) => number_of(item, numbers)?,
            None => format!("Paragraph {}", display),
        };
        Ok(Node::Emphasis {
            children: vec![Node::text(text)],
        })
    }
}

fn number_of(item: &DefinitionItem, numbers: &SectionNumbers) -> Result<String, IndexError> {
    match item.paragraph() {
        Some(info) => paragraph_number(&item.document, info, numbers),
        None => Ok(item.text.clone()),
    }
}

// ──────────────────────────────────────────────
// Grammar categories
// ──────────────────────────────────────────────

pub struct GrammarCategories;

impl KindBehavior for GrammarCategories {
    fn kind(&self) -> Kind {
        Kind::GrammarCategory
    }

    fn anchor(&self, item: &DefinitionItem) -> String {
        format!("syntax_{}", item.id)
    }

    fn render_definition(
        &self,
        item: &DefinitionItem,
        _numbers: &SectionNumbers,
    ) -> Result<Node, IndexError> {
        Ok(anchored(
            self.anchor(item),
            "spec-syntax-definition",
            vec![Node::text(&item.text)],
        ))
    }

    fn render_reference(
        &self,
        display: &str,
        _item: Option<&DefinitionItem>,
        _numbers: &SectionNumbers,
    ) -> Result<Node, IndexError> {
        Ok(Node::text(display))
    }
}

// ──────────────────────────────────────────────
// Glossary terms
// ──────────────────────────────────────────────

pub struct GlossaryTerms;

impl KindBehavior for GlossaryTerms {
    fn kind(&self) -> Kind {
        Kind::GlossaryTerm
    }

    fn anchor(&self, item: &DefinitionItem) -> String {
        format!("term_{}", item.id)
    }

    fn render_definition(
        &self,
        item: &DefinitionItem,
        _numbers: &SectionNumbers,
    ) -> Result<Node, IndexError> {
        Ok(anchored(
            self.anchor(item),
            "spec-term-definition",
            vec![Node::Emphasis {
                children: vec![Node::text(&item.text)],
            }],
        ))
    }

    fn render_reference(
        &self,
        display: &str,
        _item: Option<&DefinitionItem>,
        _numbers: &SectionNumbers,
    ) -> Result<Node, IndexError> {
        Ok(Node::text(display))
    }
}

// ──────────────────────────────────────────────
// Code constructs
// ──────────────────────────────────────────────

pub struct CodeConstructs;

impl KindBehavior for CodeConstructs {
    fn kind(&self) -> Kind {
        Kind::CodeConstruct
    }

    fn anchor(&self, item: &DefinitionItem) -> String {
        format!("code_{}", item.id)
    }

    fn render_definition(
        &self,
        item: &DefinitionItem,
        _numbers: &SectionNumbers,
    ) -> Result<Node, IndexError> {
        Ok(anchored(
            self.anchor(item),
            "spec-code-definition",
            vec![Node::Literal {
                text: item.text.clone(),
            }],
        ))
    }

    fn render_reference(
        &self,
        display: &str,
        _item: Option<&DefinitionItem>,
        _numbers: &SectionNumbers,
    ) -> Result<Node, IndexError> {
        Ok(Node::Literal {
            text: display.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: &str, section: &str, text: &str) -> DefinitionSite {
        DefinitionSite {
            id: id.into(),
            text: id.into(),
            section: Some(SectionSite {
                id: Some(section.into()),
                anchor: format!("#{}", section),
            }),
            block_text: text.into(),
        }
    }

    #[test]
    fn paragraph_sequences_count_per_section() {
        let sites = [
            site("fls_1", "fls_a", "one"),
            site("fls_2", "fls_b", "two"),
            site("fls_3", "fls_a", "three"),
        ];
        let items = Paragraphs.collect("doc", &sites).unwrap();
        let seqs: Vec<u32> = items
            .iter()
            .map(|i| i.paragraph().unwrap().sequence)
            .collect();
        assert_eq!(seqs, vec![1, 1, 2]);
    }

    #[test]
    fn paragraph_needs_a_section() {
        let mut s = site("fls_1", "fls_a", "one");
        s.section = None;
        let err = Paragraphs.collect("doc", &[s]).unwrap_err();
        assert!(matches!(err, IndexError::ParagraphOutsideSection { .. }));
    }

    #[test]
    fn paragraph_needs_a_stable_section_id() {
        let mut s = site("fls_1", "fls_a", "one");
        s.section = Some(SectionSite {
            id: None,
            anchor: "#intro".into(),
        });
        let err = Paragraphs.collect("doc", &[s]).unwrap_err();
        assert!(matches!(err, IndexError::SectionWithoutId { .. }));
    }

    #[test]
    fn checksum_tracks_content() {
        let a = content_checksum("The value is copied.");
        assert_eq!(a, content_checksum("The value is copied."));
        assert_ne!(a, content_checksum("The value is moved."));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn anchors_are_prefixed_per_kind() {
        let item = |kind| DefinitionItem {
            kind,
            id: "foo".into(),
            document: "d".into(),
            text: "Foo".into(),
            data: ItemData::Plain,
        };
        let anchor = |kind| behavior(kind).anchor(&item(kind));
        assert_eq!(anchor(Kind::GrammarCategory), "syntax_foo");
        assert_eq!(anchor(Kind::GlossaryTerm), "term_foo");
        assert_eq!(anchor(Kind::CodeConstruct), "code_foo");
    }

    #[test]
    fn missing_paragraph_reference_mentions_text() {
        let node = Paragraphs
            .render_reference("fls_gone", None, &SectionNumbers::default())
            .unwrap();
        assert_eq!(node.astext(), "Paragraph fls_gone");
    }
}
