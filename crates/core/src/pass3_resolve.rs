//! Pass 3: Resolution -- rewrite definition markers into anchored nodes and
//! reference markers into links, or into missing-reference placeholders.
//!
//! Runs only after every document is collected and merged, so references
//! may point forward or across documents freely.

use crate::ast::{Document, DocumentId, Kind, Node};
use crate::error::IndexError;
use crate::kinds::{behavior, MISSING_REF_CLASS};
use crate::pass2_number::SectionNumbers;
use crate::registry::Registry;
use serde::Serialize;

/// A reference whose target was not defined anywhere.
///
/// Node trees carry no line positions, so the location is the document
/// plus the anchor of the innermost enclosing section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub document: DocumentId,
    pub section: Option<String>,
    pub kind: Kind,
    pub target: String,
    pub text: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}: missing {} reference '{}' (target '{}')",
            self.document,
            self.section.as_deref().unwrap_or(""),
            self.kind,
            self.text,
            self.target
        )
    }
}

struct Resolver<'a> {
    document: &'a str,
    registry: &'a Registry,
    numbers: &'a SectionNumbers,
    section: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl Resolver<'_> {
    fn rewrite(&mut self, nodes: &mut [Node]) -> Result<(), IndexError> {
        for node in nodes.iter_mut() {
            match node {
                Node::Definition(marker) => {
                    let id = marker.id();
                    let item = self
                        .registry
                        .get(marker.kind, &id)
                        .filter(|item| item.document == self.document)
                        .ok_or_else(|| IndexError::UndefinedDefinition {
                            kind: marker.kind,
                            id: id.clone(),
                            document: self.document.to_owned(),
                        })?;
                    *node = behavior(marker.kind).render_definition(item, self.numbers)?;
                }
                Node::Reference(marker) => {
                    let kind = behavior(marker.kind);
                    let display = marker.display_text();
                    let target = marker.target();
                    *node = match self.registry.get(marker.kind, &target) {
                        Some(item) => Node::Link {
                            document: item.document.clone(),
                            anchor: kind.anchor(item),
                            children: vec![kind.render_reference(
                                &display,
                                Some(item),
                                self.numbers,
                            )?],
                        },
                        None => {
                            let diagnostic = Diagnostic {
                                document: self.document.to_owned(),
                                section: self.section.clone(),
                                kind: marker.kind,
                                target,
                                text: marker.text.clone(),
                            };
                            tracing::warn!("{}", diagnostic);
                            self.diagnostics.push(diagnostic);
                            Node::Inline {
                                ids: Vec::new(),
                                classes: vec![MISSING_REF_CLASS.to_owned()],
                                children: vec![kind.render_reference(
                                    &display,
                                    None,
                                    self.numbers,
                                )?],
                            }
                        }
                    };
                }
                other => {
                    let outer = match other {
                        Node::Section(s) => Some(self.section.replace(s.anchor())),
                        _ => None,
                    };
                    if let Some(children) = other.children_mut() {
                        self.rewrite(children)?;
                    }
                    if let Some(outer) = outer {
                        self.section = outer;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Resolve every marker in `document` against the merged registry.
///
/// Missing references are returned as diagnostics; only structural
/// problems are errors.
pub fn resolve(
    document: &mut Document,
    registry: &Registry,
    numbers: &SectionNumbers,
) -> Result<Vec<Diagnostic>, IndexError> {
    let mut resolver = Resolver {
        document: &document.name,
        registry,
        numbers,
        section: None,
        diagnostics: Vec::new(),
    };
    resolver.rewrite(&mut document.children)?;
    Ok(resolver.diagnostics)
}
