//! Build orchestrator: load every document, run the read phase across
//! workers, merge their registries, then number, resolve and export.
//!
//! This is a thin driver over the pass modules. Only the read phase runs
//! in parallel; each worker owns a disjoint set of documents and its own
//! [`Registry`], and the merge folds them in worker order.

use crate::ast::{Document, DocumentId};
use crate::config::ProjectConfig;
use crate::error::IndexError;
use crate::lints::{self, LintFinding};
use crate::pass1_collect;
use crate::pass2_number::{self, SectionNumbers};
use crate::pass3_resolve::{self, Diagnostic};
use crate::pass4_export::{self, ObjectEntry};
use crate::registry::Registry;
use crate::source::{self, SourceProvider};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Everything a finished build hands back to the caller.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Trees with every marker resolved, keyed by document.
    pub documents: BTreeMap<DocumentId, Document>,
    pub diagnostics: Vec<Diagnostic>,
    pub objects: Vec<ObjectEntry>,
    /// The documents → sections → paragraphs dump.
    pub paragraph_ids: Value,
    pub numbers: SectionNumbers,
}

/// Load and prepare every document the configuration names.
pub fn load_documents(
    config: &ProjectConfig,
    project_dir: &Path,
    provider: &dyn SourceProvider,
) -> Result<BTreeMap<DocumentId, Document>, IndexError> {
    let source_dir = config.source_dir(project_dir);
    let mut documents = BTreeMap::new();
    for name in config.documents() {
        if !provider.exists(&source_dir, name) {
            return Err(IndexError::UnknownDocument {
                document: name.to_owned(),
            });
        }
        let mut document = source::load_document(provider, &source_dir, name)?;
        pass1_collect::prepare(&mut document);
        documents.insert(name.to_owned(), document);
    }
    Ok(documents)
}

/// Read phase: collect `documents` on up to `jobs` workers and merge the
/// partial registries.
pub fn read_phase(
    documents: &BTreeMap<DocumentId, Document>,
    id_prefix: &str,
    jobs: usize,
) -> Result<Registry, IndexError> {
    let all: Vec<&Document> = documents.values().collect();
    if all.is_empty() {
        return Ok(Registry::new());
    }
    let per_worker = all.len().div_ceil(jobs.clamp(1, all.len()));

    let partials: Vec<Result<(Registry, BTreeSet<DocumentId>), IndexError>> =
        std::thread::scope(|s| {
            let tasks: Vec<_> = all
                .chunks(per_worker)
                .map(|chunk| {
                    s.spawn(move || {
                        let mut registry = Registry::new();
                        let mut keep = BTreeSet::new();
                        for document in chunk {
                            pass1_collect::collect(&mut registry, document, id_prefix)?;
                            keep.insert(document.name.clone());
                        }
                        Ok::<_, IndexError>((registry, keep))
                    })
                })
                .collect();
            tasks
                .into_iter()
                .map(|task| match task.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

    let workers = partials.len();
    let mut merged = Registry::new();
    for partial in partials {
        let (registry, keep) = partial?;
        merged.merge(&registry, &keep)?;
    }
    tracing::info!(
        documents = documents.len(),
        workers,
        definitions = merged.len(),
        "read phase complete"
    );
    Ok(merged)
}

/// Numbering, resolution and export over a fully collected registry.
///
/// `documents` are consumed and returned resolved; the registry is only read.
pub fn finish(
    config: &ProjectConfig,
    registry: &Registry,
    mut documents: BTreeMap<DocumentId, Document>,
) -> Result<BuildOutput, IndexError> {
    let numbers = pass2_number::number_sections(&config.roots, &documents)?;

    let mut diagnostics = Vec::new();
    for document in documents.values_mut() {
        diagnostics.extend(pass3_resolve::resolve(document, registry, &numbers)?);
    }

    let objects = pass4_export::objects(registry, &numbers)?;
    let paragraph_ids =
        pass4_export::paragraph_ids(registry, &numbers, &config.project.link_suffix)?;

    tracing::info!(
        documents = documents.len(),
        objects = objects.len(),
        missing_references = diagnostics.len(),
        "build finished"
    );
    Ok(BuildOutput {
        documents,
        diagnostics,
        objects,
        paragraph_ids,
        numbers,
    })
}

/// Full build of the project at `project_dir`.
pub fn build(
    config: &ProjectConfig,
    project_dir: &Path,
    provider: &dyn SourceProvider,
    jobs: usize,
) -> Result<BuildOutput, IndexError> {
    let documents = load_documents(config, project_dir, provider)?;
    let registry = read_phase(&documents, &config.project.id_prefix, jobs)?;
    finish(config, &registry, documents)
}

/// Run the paragraph-id lint over prepared documents.
pub fn lint(
    config: &ProjectConfig,
    documents: &BTreeMap<DocumentId, Document>,
) -> Vec<LintFinding> {
    documents
        .values()
        .flat_map(|d| {
            lints::check_document(
                d,
                &config.project.id_prefix,
                config.requires_paragraph_ids(&d.name),
            )
        })
        .collect()
}

// ──────────────────────────────────────────────
// Incremental builds
// ──────────────────────────────────────────────

/// Registry and trees kept alive between builds, so that only changed
/// documents are collected again.
pub struct IncrementalBuild {
    config: ProjectConfig,
    registry: Registry,
    documents: BTreeMap<DocumentId, Document>,
}

impl IncrementalBuild {
    pub fn new(config: ProjectConfig) -> Self {
        IncrementalBuild {
            config,
            registry: Registry::new(),
            documents: BTreeMap::new(),
        }
    }

    /// Start from a completed read phase.
    pub fn from_parts(
        config: ProjectConfig,
        registry: Registry,
        documents: BTreeMap<DocumentId, Document>,
    ) -> Self {
        IncrementalBuild {
            config,
            registry,
            documents,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn documents(&self) -> &BTreeMap<DocumentId, Document> {
        &self.documents
    }

    /// Replace `document`'s contributions with those of its new tree.
    ///
    /// On error the document is left out of the build entirely.
    pub fn update(&mut self, mut document: Document) -> Result<(), IndexError> {
        pass1_collect::prepare(&mut document);
        self.registry.invalidate(&document.name);
        if let Err(e) =
            pass1_collect::collect(&mut self.registry, &document, &self.config.project.id_prefix)
        {
            self.documents.remove(&document.name);
            return Err(e);
        }
        tracing::debug!(document = %document.name, "document updated");
        self.documents.insert(document.name.clone(), document);
        Ok(())
    }

    /// Drop a deleted document.
    pub fn remove(&mut self, document: &str) {
        self.registry.invalidate(document);
        self.documents.remove(document);
    }

    /// Number, resolve and export the current state.
    pub fn finish(&self) -> Result<BuildOutput, IndexError> {
        finish(&self.config, &self.registry, self.documents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Kind, Node, Section};
    use crate::pass2_number::NumberingRoot;
    use crate::source::InMemoryProvider;

    fn chapter(name: &str, children: Vec<Node>) -> Document {
        Document::new(
            name,
            vec![Node::Section(Section {
                id: Some(format!("fls_{}", name)),
                title: name.to_uppercase(),
                children,
            })],
        )
    }

    fn config(chapters: &[&str]) -> ProjectConfig {
        let mut config = ProjectConfig::default();
        config.roots.push(NumberingRoot {
            chapters: chapters.iter().map(|s| s.to_string()).collect(),
            appendices: Vec::new(),
        });
        config
    }

    fn docs() -> Vec<Document> {
        vec![
            chapter(
                "a",
                vec![Node::paragraph(vec![
                    Node::definition(Kind::Paragraph, "fls_a1"),
                    Node::reference(Kind::GlossaryTerm, "later"),
                ])],
            ),
            chapter(
                "b",
                vec![Node::paragraph(vec![
                    Node::definition(Kind::Paragraph, "fls_b1"),
                    Node::definition(Kind::GlossaryTerm, "Later"),
                ])],
            ),
            chapter("c", vec![Node::Syntax { text: "C ::= A".into() }]),
        ]
    }

    #[test]
    fn read_phase_is_independent_of_job_count() {
        let documents: BTreeMap<_, _> = docs().into_iter().map(|d| (d.name.clone(), d)).collect();
        let one = read_phase(&documents, "fls_", 1).unwrap();
        let two = read_phase(&documents, "fls_", 2).unwrap();
        let many = read_phase(&documents, "fls_", 16).unwrap();
        assert_eq!(one, two);
        assert_eq!(one, many);
    }

    #[test]
    fn build_from_provider_resolves_forward_references() {
        let mut provider = InMemoryProvider::default();
        for d in docs() {
            provider.insert_document(Path::new("/p/src"), &d);
        }
        let output = build(&config(&["a", "b", "c"]), Path::new("/p"), &provider, 2).unwrap();
        // "A" in the syntax block has no definition anywhere
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].target, "a");
        let Node::Section(s) = &output.documents["a"].children[0] else {
            panic!("section expected")
        };
        assert_eq!(s.children[0].astext(), "1:1later");
    }

    #[test]
    fn unlisted_file_is_unknown() {
        let provider = InMemoryProvider::default();
        let err = build(&config(&["missing"]), Path::new("/p"), &provider, 1).unwrap_err();
        assert!(matches!(err, IndexError::UnknownDocument { .. }));
    }

    #[test]
    fn incremental_update_and_remove() {
        let mut inc = IncrementalBuild::new(config(&["a", "b", "c"]));
        for d in docs() {
            inc.update(d).unwrap();
        }
        let before = inc.registry().clone();

        inc.update(docs().remove(1)).unwrap();
        assert_eq!(inc.registry(), &before);

        inc.remove("b");
        assert!(inc.registry().get(Kind::GlossaryTerm, "later").is_none());
        // b is still a chapter of the root
        assert!(matches!(
            inc.finish().unwrap_err(),
            IndexError::UnknownDocument { .. }
        ));
    }

    #[test]
    fn failed_update_drops_the_document() {
        let mut inc = IncrementalBuild::new(config(&["a", "b"]));
        for d in docs().into_iter().take(2) {
            inc.update(d).unwrap();
        }
        let clash = chapter("a", vec![Node::definition(Kind::GlossaryTerm, "later")]);
        assert!(inc.update(clash).is_err());
        assert!(!inc.documents().contains_key("a"));
        assert!(!inc.registry().contains_document("a"));
    }
}
