#![allow(clippy::result_large_err)]
//! specref-core: cross-document symbol index and reference resolver.
//!
//! Documents are collected into a [`Registry`] (possibly on several
//! workers whose registries are then merged), sections are numbered, and
//! every definition and reference marker is resolved into anchored nodes
//! and links.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`build()`] -- load, collect, merge, number, resolve and export
//! - [`IncrementalBuild`] -- keep the registry between builds
//! - [`Registry`] -- definitions per kind, plus per-document records
//! - [`IndexError`] -- fatal error type; missing references are [`Diagnostic`]s
//! - Tree types: [`Document`], [`Node`], [`Section`], [`Kind`]
//!
//! Individual pass entry functions are also re-exported for selective
//! pipeline execution.

pub mod ast;
pub mod build;
pub mod config;
pub mod error;
pub mod kinds;
pub mod lexer;
pub mod lints;
pub mod pass1_collect;
pub mod pass2_number;
pub mod pass3_resolve;
pub mod pass4_export;
pub mod registry;
pub mod source;
pub mod syntax;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Document, DocumentId, Kind, Node, Section};
pub use build::{BuildOutput, IncrementalBuild};
pub use config::ProjectConfig;
pub use error::IndexError;
pub use lints::LintFinding;
pub use pass2_number::{NumberingRoot, SectionNumber, SectionNumbers};
pub use pass3_resolve::Diagnostic;
pub use pass4_export::ObjectEntry;
pub use registry::{DefinitionItem, ReferenceItem, Registry};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use build::{build, finish, lint, load_documents, read_phase};
pub use pass1_collect::collect;
pub use pass2_number::number_sections;
pub use pass3_resolve::resolve;
pub use registry::merge;
