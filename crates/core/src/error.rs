use crate::ast::{DocumentId, Kind};

/// A fatal indexing error. Missing references are not errors; see
/// [`crate::pass3_resolve::Diagnostic`].
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The same id was defined twice within one kind.
    #[error("duplicate {kind} id '{id}' in {document}: first defined in {first_document}")]
    DuplicateDefinition {
        kind: Kind,
        id: String,
        document: DocumentId,
        first_document: DocumentId,
    },

    /// Two workers both claim a definition, or a kept document's item
    /// collides with one owned by a different document.
    #[error("merge conflict on {kind} id '{id}': owned by both {ours} and {theirs}")]
    MergeConflict {
        kind: Kind,
        id: String,
        ours: DocumentId,
        theirs: DocumentId,
    },

    #[error("paragraph '{id}' in {document} is not inside a section")]
    ParagraphOutsideSection { id: String, document: DocumentId },

    #[error("paragraph '{id}' in {document} is inside a section without an id")]
    SectionWithoutId { id: String, document: DocumentId },

    #[error("section id '{id}' is used more than once in {document}")]
    DuplicateSection { id: String, document: DocumentId },

    #[error("section '{id}' in {document} has no title")]
    SectionWithoutTitle { id: String, document: DocumentId },

    #[error("more than 26 appendices are not supported ({document} would be appendix {number})")]
    AppendixOverflow { document: DocumentId, number: u32 },

    /// A definition marker survived collection without a registry entry.
    #[error("{kind} definition '{id}' in {document} was never collected")]
    UndefinedDefinition {
        kind: Kind,
        id: String,
        document: DocumentId,
    },

    #[error("section {anchor} in {document} has no section number")]
    MissingSectionNumber { document: DocumentId, anchor: String },

    #[error("unknown document '{document}'")]
    UnknownDocument { document: DocumentId },

    #[error("cannot read {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid document tree in {path}: {message}")]
    Document { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl IndexError {
    /// Short machine-readable name of the variant.
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::DuplicateDefinition { .. } => "duplicate_definition",
            IndexError::MergeConflict { .. } => "merge_conflict",
            IndexError::ParagraphOutsideSection { .. } => "paragraph_outside_section",
            IndexError::SectionWithoutId { .. } => "section_without_id",
            IndexError::DuplicateSection { .. } => "duplicate_section",
            IndexError::SectionWithoutTitle { .. } => "section_without_title",
            IndexError::AppendixOverflow { .. } => "appendix_overflow",
            IndexError::UndefinedDefinition { .. } => "undefined_definition",
            IndexError::MissingSectionNumber { .. } => "missing_section_number",
            IndexError::UnknownDocument { .. } => "unknown_document",
            IndexError::Source { .. } => "source",
            IndexError::Document { .. } => "document",
            IndexError::Config(_) => "config",
        }
    }

    fn document(&self) -> Option<&str> {
        match self {
            IndexError::DuplicateDefinition { document, .. }
            | IndexError::ParagraphOutsideSection { document, .. }
            | IndexError::SectionWithoutId { document, .. }
            | IndexError::DuplicateSection { document, .. }
            | IndexError::SectionWithoutTitle { document, .. }
            | IndexError::AppendixOverflow { document, .. }
            | IndexError::UndefinedDefinition { document, .. }
            | IndexError::MissingSectionNumber { document, .. }
            | IndexError::UnknownDocument { document } => Some(document),
            IndexError::MergeConflict { theirs, .. } => Some(theirs),
            IndexError::Source { path, .. } | IndexError::Document { path, .. } => Some(path),
            IndexError::Config(_) => None,
        }
    }

    /// Serialize for `--output json`. Always carries every key.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "code":     self.code(),
            "document": self.document(),
            "message":  self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_message_mentions_the_limit() {
        let e = IndexError::AppendixOverflow {
            document: "extra".into(),
            number: 27,
        };
        assert!(e.to_string().contains("more than 26 appendices"));
        let v = e.to_json_value();
        assert_eq!(v["code"], "appendix_overflow");
        assert_eq!(v["document"], "extra");
    }

    #[test]
    fn config_error_has_null_document() {
        let v = IndexError::Config("bad".into()).to_json_value();
        assert!(v["document"].is_null());
    }
}
