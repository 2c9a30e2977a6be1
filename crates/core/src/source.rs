//! Source provider abstraction for loading document trees.
//!
//! The [`SourceProvider`] trait abstracts file I/O so builds can run
//! against the filesystem or against trees held in memory (tests, editors
//! that hand over unsaved buffers).

use crate::ast::{Document, Node};
use crate::error::IndexError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File extension of serialized document trees.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Trait that abstracts file I/O for the build pipeline.
pub trait SourceProvider: Sync {
    /// Read the raw text stored at `path`.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;

    /// Path of the tree for `document` under `source_dir`.
    fn document_path(&self, source_dir: &Path, document: &str) -> PathBuf {
        source_dir.join(format!("{}.{}", document, DOCUMENT_EXTENSION))
    }

    /// Whether a tree for `document` exists under `source_dir`.
    fn exists(&self, source_dir: &Path, document: &str) -> bool;
}

/// On-disk shape of a document tree: `{ "children": [ ...nodes ] }`.
#[derive(Deserialize)]
struct DocumentFile {
    children: Vec<Node>,
}

/// Read and decode the tree for `document`.
pub fn load_document(
    provider: &dyn SourceProvider,
    source_dir: &Path,
    document: &str,
) -> Result<Document, IndexError> {
    let path = provider.document_path(source_dir, document);
    let text = provider
        .read_source(&path)
        .map_err(|source| IndexError::Source {
            path: path.display().to_string(),
            source,
        })?;
    let file: DocumentFile = serde_json::from_str(&text).map_err(|e| IndexError::Document {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(Document::new(document, file.children))
}

/// Default filesystem-backed source provider.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, source_dir: &Path, document: &str) -> bool {
        self.document_path(source_dir, document).is_file()
    }
}

/// In-memory source provider for testing.
///
/// Maps paths to file contents. Lookups normalize the path without
/// touching the filesystem.
#[derive(Default)]
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new(files: HashMap<PathBuf, String>) -> Self {
        Self { files }
    }

    /// Store the serialized tree of `document` under `source_dir`.
    pub fn insert_document(&mut self, source_dir: &Path, document: &Document) {
        let path = Self::normalize_path(&self.document_path(source_dir, &document.name));
        let body = serde_json::json!({ "children": document.children });
        self.files.insert(path, body.to_string());
    }

    /// Normalize a path by resolving `.` and `..` components without
    /// touching the filesystem.
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                std::path::Component::CurDir => {}
                std::path::Component::ParentDir => {
                    components.pop();
                }
                other => components.push(other),
            }
        }
        components.iter().collect()
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let normalized = Self::normalize_path(path);
        self.files.get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }

    fn exists(&self, source_dir: &Path, document: &str) -> bool {
        let path = Self::normalize_path(&self.document_path(source_dir, document));
        self.files.contains_key(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Kind;

    #[test]
    fn normalize_path_resolves_dot_and_dotdot() {
        let p = Path::new("/a/b/../c/./d");
        let normalized = InMemoryProvider::normalize_path(p);
        assert_eq!(normalized, PathBuf::from("/a/c/d"));
    }

    #[test]
    fn loads_document_tree() {
        let mut files = HashMap::new();
        files.insert(
            PathBuf::from("/p/src/intro.json"),
            r#"{"children":[{"type":"paragraph","children":[
                {"type":"definition","kind":"term","text":"Value"}]}]}"#
                .to_string(),
        );
        let provider = InMemoryProvider::new(files);
        let doc = load_document(&provider, Path::new("/p/./src"), "intro").unwrap();
        assert_eq!(doc.name, "intro");
        assert_eq!(
            doc.children,
            vec![Node::paragraph(vec![Node::definition(Kind::GlossaryTerm, "Value")])]
        );
    }

    #[test]
    fn missing_document_is_a_source_error() {
        let provider = InMemoryProvider::default();
        let err = load_document(&provider, Path::new("/p"), "gone").unwrap_err();
        match err {
            IndexError::Source { path, source } => {
                assert_eq!(path, "/p/gone.json");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn malformed_tree_is_a_document_error() {
        let mut files = HashMap::new();
        files.insert(PathBuf::from("/p/bad.json"), r#"{"children":[{"type":"nope"}]}"#.into());
        let provider = InMemoryProvider::new(files);
        let err = load_document(&provider, Path::new("/p"), "bad").unwrap_err();
        assert!(matches!(err, IndexError::Document { .. }));
    }

    #[test]
    fn inserted_documents_round_trip() {
        let mut provider = InMemoryProvider::default();
        let doc = Document::new("a", vec![Node::text("hello")]);
        provider.insert_document(Path::new("/src"), &doc);
        assert!(provider.exists(Path::new("/src"), "a"));
        assert!(!provider.exists(Path::new("/src"), "b"));
        assert_eq!(load_document(&provider, Path::new("/src"), "a").unwrap(), doc);
    }
}
