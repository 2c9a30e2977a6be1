//! Pass 1: Collection -- expand syntax blocks, then record every
//! definition, reference and section a document contributes.
//!
//! Collection expects the document's previous contributions to have been
//! removed with [`Registry::invalidate`] first; [`crate::build`] always
//! does so.

use crate::ast::{Document, Kind, Node};
use crate::error::IndexError;
use crate::kinds::{behavior, DefinitionSite, SectionSite};
use crate::registry::{DocumentRecord, ReferenceItem, Registry, SectionRecord};
use crate::syntax;
use std::collections::{BTreeMap, HashSet};

/// Read-phase preparation of a freshly loaded tree.
pub fn prepare(document: &mut Document) {
    syntax::expand_syntax_blocks(&mut document.children);
}

#[derive(Default)]
struct Walk {
    sites: BTreeMap<Kind, Vec<DefinitionSite>>,
    references: Vec<ReferenceItem>,
    sections: Vec<SectionRecord>,
}

struct Context<'a> {
    document: &'a str,
    prefix: &'a str,
    section: Option<SectionSite>,
    block_text: Option<String>,
}

impl Walk {
    fn node(&mut self, node: &Node, cx: &Context<'_>) -> Result<(), IndexError> {
        match node {
            Node::Section(section) => {
                let site = SectionSite {
                    id: section.stable_id(cx.prefix).map(str::to_owned),
                    anchor: section.anchor(),
                };
                if let Some(id) = &site.id {
                    if section.title.trim().is_empty() {
                        return Err(IndexError::SectionWithoutTitle {
                            id: id.clone(),
                            document: cx.document.to_owned(),
                        });
                    }
                    if self.sections.iter().any(|s| &s.id == id) {
                        return Err(IndexError::DuplicateSection {
                            id: id.clone(),
                            document: cx.document.to_owned(),
                        });
                    }
                    self.sections.push(SectionRecord {
                        id: id.clone(),
                        title: section.title.clone(),
                        anchor: site.anchor.clone(),
                        document: cx.document.to_owned(),
                    });
                }
                let inner = Context {
                    document: cx.document,
                    prefix: cx.prefix,
                    section: Some(site),
                    block_text: None,
                };
                self.children(&section.children, &inner)
            }
            Node::Paragraph { children } | Node::ListItem { children } => {
                let inner = Context {
                    document: cx.document,
                    prefix: cx.prefix,
                    section: cx.section.clone(),
                    block_text: Some(node.astext().replace('\n', " ")),
                };
                self.children(children, &inner)
            }
            Node::Definition(marker) => {
                self.sites
                    .entry(marker.kind)
                    .or_default()
                    .push(DefinitionSite {
                        id: marker.id(),
                        text: marker.text.clone(),
                        section: cx.section.clone(),
                        block_text: cx
                            .block_text
                            .clone()
                            .unwrap_or_else(|| marker.text.replace('\n', " ")),
                    });
                Ok(())
            }
            Node::Reference(marker) => {
                self.references.push(ReferenceItem {
                    kind: marker.kind,
                    source_document: cx.document.to_owned(),
                    target_id: marker.target(),
                });
                Ok(())
            }
            other => self.children(other.children(), cx),
        }
    }

    fn children(&mut self, nodes: &[Node], cx: &Context<'_>) -> Result<(), IndexError> {
        for n in nodes {
            self.node(n, cx)?;
        }
        Ok(())
    }
}

/// Scan `document` and add its contributions to `registry`.
///
/// Fails without touching the registry when the document defines an id
/// twice within a kind, or defines an id another document already owns.
pub fn collect(
    registry: &mut Registry,
    document: &Document,
    id_prefix: &str,
) -> Result<(), IndexError> {
    let mut walk = Walk::default();
    let cx = Context {
        document: &document.name,
        prefix: id_prefix,
        section: None,
        block_text: None,
    };
    walk.children(&document.children, &cx)?;

    let mut items = Vec::new();
    for (kind, sites) in &walk.sites {
        let mut seen: HashSet<&str> = HashSet::new();
        for site in sites {
            if !seen.insert(site.id.as_str()) {
                return Err(IndexError::DuplicateDefinition {
                    kind: *kind,
                    id: site.id.clone(),
                    document: document.name.clone(),
                    first_document: document.name.clone(),
                });
            }
        }
        items.extend(behavior(*kind).collect(&document.name, sites)?);
    }

    for item in &items {
        if let Some(existing) = registry.get(item.kind, &item.id) {
            if existing.document != item.document {
                return Err(IndexError::DuplicateDefinition {
                    kind: item.kind,
                    id: item.id.clone(),
                    document: item.document.clone(),
                    first_document: existing.document.clone(),
                });
            }
        }
    }

    let definitions = items.len();
    for item in items {
        registry.insert_definition(item)?;
    }
    tracing::debug!(
        document = %document.name,
        definitions,
        references = walk.references.len(),
        sections = walk.sections.len(),
        "collected document"
    );
    registry.set_document(
        &document.name,
        DocumentRecord {
            title: document.title().map(str::to_owned),
            sections: walk.sections,
            references: walk.references,
        },
    );
    Ok(())
}
