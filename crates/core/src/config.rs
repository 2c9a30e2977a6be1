//! Project configuration, loaded from `specref.toml` at the project root.

use crate::ast::DocumentId;
use crate::error::IndexError;
use crate::pass2_number::NumberingRoot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "specref.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub project: ProjectSettings,
    pub roots: Vec<NumberingRoot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Directory holding `<document>.json` trees, relative to the project root.
    pub source_dir: PathBuf,
    /// Prefix that marks ids as stable.
    pub id_prefix: String,
    /// Appended to document names to form page links.
    pub link_suffix: String,
    /// Documents that must not carry paragraph ids.
    pub no_paragraph_ids: Vec<DocumentId>,
    /// Documents outside every numbering root.
    pub extra_documents: Vec<DocumentId>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            id_prefix: "fls_".to_string(),
            link_suffix: ".html".to_string(),
            no_paragraph_ids: Vec::new(),
            extra_documents: Vec::new(),
        }
    }
}

impl ProjectConfig {
    /// Load `specref.toml` from a project directory.
    pub fn load(project_dir: &Path) -> Result<Self, IndexError> {
        let path = project_dir.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path).map_err(|source| IndexError::Source {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, IndexError> {
        let config: ProjectConfig =
            toml::from_str(content).map_err(|e| IndexError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Every document appears at most once across roots and extras.
    fn validate(&self) -> Result<(), IndexError> {
        let mut seen = BTreeSet::new();
        for name in self.documents() {
            if !seen.insert(name) {
                return Err(IndexError::Config(format!(
                    "document '{}' is listed more than once",
                    name
                )));
            }
        }
        for name in &self.project.no_paragraph_ids {
            if !seen.contains(name.as_str()) {
                return Err(IndexError::UnknownDocument {
                    document: name.clone(),
                });
            }
        }
        Ok(())
    }

    /// All documents in build order: each root's chapters then appendices,
    /// then the extra documents.
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.roots
            .iter()
            .flat_map(|r| r.chapters.iter().chain(r.appendices.iter()))
            .chain(self.project.extra_documents.iter())
            .map(String::as_str)
    }

    pub fn requires_paragraph_ids(&self, document: &str) -> bool {
        !self.project.no_paragraph_ids.iter().any(|d| d == document)
    }

    pub fn source_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.project.source_dir)
    }
}
