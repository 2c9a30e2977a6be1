//! The symbol registry: definitions per kind, references and section
//! records per document.
//!
//! Every entry is owned by exactly one document, which is what makes
//! [`Registry::invalidate`] and [`Registry::merge`] well defined. All maps
//! are ordered so two registries holding the same contributions compare
//! equal regardless of the order they were built in.

use crate::ast::{DocumentId, Kind};
use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Extra data recorded for paragraph definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphInfo {
    /// Stable id of the enclosing section
    pub section_id: String,
    /// Anchor of the enclosing section, the key into section numbers
    pub section_anchor: String,
    /// 1-based position among the section's paragraph definitions
    pub sequence: u32,
    /// Lowercase hex SHA-256 of the paragraph's plain text
    pub content_checksum: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemData {
    Plain,
    Paragraph(ParagraphInfo),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionItem {
    pub kind: Kind,
    pub id: String,
    pub document: DocumentId,
    /// Text of the definition marker as written
    pub text: String,
    pub data: ItemData,
}

impl DefinitionItem {
    pub fn paragraph(&self) -> Option<&ParagraphInfo> {
        match &self.data {
            ItemData::Paragraph(p) => Some(p),
            ItemData::Plain => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub kind: Kind,
    pub source_document: DocumentId,
    pub target_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub id: String,
    pub title: String,
    pub anchor: String,
    pub document: DocumentId,
}

/// Per-document data that is not keyed by a definition id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub title: Option<String>,
    pub sections: Vec<SectionRecord>,
    pub references: Vec<ReferenceItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    definitions: BTreeMap<Kind, BTreeMap<String, DefinitionItem>>,
    documents: BTreeMap<DocumentId, DocumentRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn get(&self, kind: Kind, id: &str) -> Option<&DefinitionItem> {
        self.definitions.get(&kind).and_then(|m| m.get(id))
    }

    /// Definitions of one kind, ordered by id.
    pub fn definitions(&self, kind: Kind) -> impl Iterator<Item = &DefinitionItem> {
        self.definitions.get(&kind).into_iter().flat_map(|m| m.values())
    }

    pub fn all_definitions(&self) -> impl Iterator<Item = &DefinitionItem> {
        self.definitions.values().flat_map(|m| m.values())
    }

    pub fn references(&self) -> impl Iterator<Item = &ReferenceItem> {
        self.documents.values().flat_map(|d| d.references.iter())
    }

    /// Documents that have been collected, in name order.
    pub fn documents(&self) -> impl Iterator<Item = (&DocumentId, &DocumentRecord)> {
        self.documents.iter()
    }

    pub fn document(&self, name: &str) -> Option<&DocumentRecord> {
        self.documents.get(name)
    }

    pub fn contains_document(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove everything `document` contributed.
    pub fn invalidate(&mut self, document: &str) {
        for items in self.definitions.values_mut() {
            items.retain(|_, item| item.document != document);
        }
        self.definitions.retain(|_, items| !items.is_empty());
        self.documents.remove(document);
    }

    /// Record that `document` has been collected, replacing any earlier record.
    pub(crate) fn set_document(&mut self, document: &str, record: DocumentRecord) {
        self.documents.insert(document.to_owned(), record);
    }

    /// Insert a definition. A stale entry owned by the same document is
    /// overwritten; an entry owned by another document is a duplicate.
    pub(crate) fn insert_definition(&mut self, item: DefinitionItem) -> Result<(), IndexError> {
        let items = self.definitions.entry(item.kind).or_default();
        if let Some(existing) = items.get(&item.id) {
            if existing.document != item.document {
                return Err(IndexError::DuplicateDefinition {
                    kind: item.kind,
                    id: item.id,
                    document: item.document,
                    first_document: existing.document.clone(),
                });
            }
        }
        items.insert(item.id.clone(), item);
        Ok(())
    }

    /// Fold in the contributions `other` holds for the documents in `keep`.
    ///
    /// Kept documents are owned by `other`: whatever this registry held for
    /// them is dropped first, so merging is idempotent, and merging
    /// disjoint `keep` sets gives the same result in any order.
    pub fn merge(
        &mut self,
        other: &Registry,
        keep: &BTreeSet<DocumentId>,
    ) -> Result<(), IndexError> {
        for document in keep {
            self.invalidate(document);
        }

        for item in other.all_definitions() {
            if !keep.contains(&item.document) {
                continue;
            }
            let items = self.definitions.entry(item.kind).or_default();
            if let Some(existing) = items.get(&item.id) {
                return Err(IndexError::MergeConflict {
                    kind: item.kind,
                    id: item.id.clone(),
                    ours: existing.document.clone(),
                    theirs: item.document.clone(),
                });
            }
            items.insert(item.id.clone(), item.clone());
        }

        for (name, record) in &other.documents {
            if keep.contains(name) {
                self.documents.insert(name.clone(), record.clone());
            }
        }

        tracing::debug!(
            documents = keep.len(),
            definitions = self.len(),
            "merged worker registry"
        );
        Ok(())
    }
}

/// Pure form of [`Registry::merge`].
pub fn merge(
    mut into: Registry,
    from: &Registry,
    keep: &BTreeSet<DocumentId>,
) -> Result<Registry, IndexError> {
    into.merge(from, keep)?;
    Ok(into)
}
