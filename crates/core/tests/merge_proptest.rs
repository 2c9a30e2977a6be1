//! Property-based tests for registry merging
//!
//! Documents are collected on randomly partitioned workers and the
//! partial registries merged in a random order. The result must always
//! equal a plain sequential collection of every document.

use proptest::prelude::*;
use specref_core::ast::{Document, Kind, Node, Section};
use specref_core::{collect, merge, Registry};
use std::collections::BTreeSet;

const DOCUMENTS: usize = 8;
const MAX_WORKERS: usize = 4;
const CATEGORY_SUFFIXES: [&str; DOCUMENTS] = [
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta",
];

/// Shape of one generated document: term count, paragraph count and the
/// document its references point at.
fn document_shape() -> impl Strategy<Value = (usize, usize, usize)> {
    (0..4usize, 0..4usize, 0..DOCUMENTS)
}

fn make_document(index: usize, (terms, paragraphs, target): (usize, usize, usize)) -> Document {
    let mut children = Vec::new();
    for p in 0..paragraphs {
        children.push(Node::paragraph(vec![
            Node::definition(Kind::Paragraph, format!("fls_d{}_p{}", index, p)),
            Node::text(format!("Paragraph {} of document {}.", p, index)),
            Node::reference(Kind::GlossaryTerm, format!("Term {} 0", target)),
        ]));
    }
    for t in 0..terms {
        children.push(Node::definition(Kind::GlossaryTerm, format!("Term {} {}", index, t)));
    }
    children.push(Node::Syntax {
        text: format!("Doc{} ::= $$x$$", CATEGORY_SUFFIXES[index]),
    });
    let mut document = Document::new(
        format!("doc{}", index),
        vec![Node::Section(Section {
            id: Some(format!("fls_doc{}", index)),
            title: format!("Document {}", index),
            children,
        })],
    );
    specref_core::pass1_collect::prepare(&mut document);
    document
}

fn corpus() -> impl Strategy<Value = Vec<Document>> {
    prop::collection::vec(document_shape(), DOCUMENTS).prop_map(|shapes| {
        shapes
            .into_iter()
            .enumerate()
            .map(|(i, shape)| make_document(i, shape))
            .collect()
    })
}

fn sequential(documents: &[Document]) -> Registry {
    let mut registry = Registry::new();
    for d in documents {
        collect(&mut registry, d, "fls_").unwrap();
    }
    registry
}

/// Collect each worker's documents into its own registry.
fn workers(documents: &[Document], assignment: &[usize]) -> Vec<(Registry, BTreeSet<String>)> {
    let mut partials: Vec<(Registry, BTreeSet<String>)> =
        (0..MAX_WORKERS).map(|_| Default::default()).collect();
    for (document, worker) in documents.iter().zip(assignment) {
        let (registry, keep) = &mut partials[*worker];
        collect(registry, document, "fls_").unwrap();
        keep.insert(document.name.clone());
    }
    partials
}

proptest! {
    #[test]
    fn merge_order_does_not_matter(
        documents in corpus(),
        assignment in prop::collection::vec(0..MAX_WORKERS, DOCUMENTS),
        order in Just((0..MAX_WORKERS).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let partials = workers(&documents, &assignment);

        let mut merged = Registry::new();
        for w in &order {
            let (registry, keep) = &partials[*w];
            merged = merge(merged, registry, keep).unwrap();
        }

        prop_assert_eq!(merged, sequential(&documents));
    }

    #[test]
    fn merging_twice_is_idempotent(
        documents in corpus(),
        assignment in prop::collection::vec(0..MAX_WORKERS, DOCUMENTS),
    ) {
        let partials = workers(&documents, &assignment);

        let mut once = Registry::new();
        for (registry, keep) in &partials {
            once = merge(once, registry, keep).unwrap();
        }
        let mut twice = once.clone();
        for (registry, keep) in partials.iter().rev() {
            twice = merge(twice, registry, keep).unwrap();
        }

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn recollecting_a_document_round_trips(
        documents in corpus(),
        victim in 0..DOCUMENTS,
    ) {
        let mut registry = sequential(&documents);
        let before = registry.clone();

        registry.invalidate(&documents[victim].name);
        prop_assert!(!registry.contains_document(&documents[victim].name));
        collect(&mut registry, &documents[victim], "fls_").unwrap();

        prop_assert_eq!(registry, before);
    }
}
