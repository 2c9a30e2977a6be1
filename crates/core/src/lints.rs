//! Paragraph-id lint: every normative paragraph starts with its own id,
//! and ids appear nowhere else.

use crate::ast::{Document, DocumentId, Node};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintFinding {
    pub document: DocumentId,
    pub message: String,
}

impl fmt::Display for LintFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.document, self.message)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Parent {
    Root,
    Section,
    ListItem,
    Other,
}

struct Linter<'a> {
    document: &'a str,
    prefix: &'a str,
    findings: Vec<LintFinding>,
}

impl Linter<'_> {
    fn report(&mut self, message: String) {
        tracing::warn!(document = self.document, "{}", message);
        self.findings.push(LintFinding {
            document: self.document.to_owned(),
            message,
        });
    }

    fn is_id(&self, node: &Node) -> bool {
        matches!(node, Node::Definition(d)
            if d.kind == crate::ast::Kind::Paragraph && d.id().starts_with(self.prefix))
    }

    fn check_has_ids(&mut self, node: &Node, parent: Parent) {
        match (node, parent) {
            (Node::Paragraph { children }, Parent::Section) => {
                self.should_have_id(children, "paragraph")
            }
            (Node::Paragraph { children }, Parent::ListItem) => {
                self.should_have_id(children, "list item")
            }
            (Node::Section(section), _) => {
                if section.stable_id(self.prefix).is_none() {
                    self.report(format!("section '{}' should have an id", section.title));
                }
            }
            (other, _) => self.should_not_have_id(other),
        }

        let next = parent_of(node);
        for child in node.children() {
            self.check_has_ids(child, next);
        }
    }

    fn check_does_not_have_ids(&mut self, node: &Node) {
        match node {
            Node::Section(section) => {
                if section.stable_id(self.prefix).is_some() {
                    self.report(format!("section '{}' should not have an id", section.title));
                }
            }
            other => self.should_not_have_id(other),
        }
        for child in node.children() {
            self.check_does_not_have_ids(child);
        }
    }

    fn should_have_id(&mut self, children: &[Node], what: &str) {
        if children.iter().skip(1).any(|c| self.is_id(c)) {
            self.report(format!("id in {} is not the first element", what));
        } else if !children.first().is_some_and(|c| self.is_id(c)) {
            self.report(format!("{} should have an id", what));
        }
    }

    fn should_not_have_id(&mut self, node: &Node) {
        if node.children().iter().any(|c| self.is_id(c)) {
            self.report(format!("{} should not have an id", node_name(node)));
        }
    }
}

fn parent_of(node: &Node) -> Parent {
    match node {
        Node::Section(_) => Parent::Section,
        Node::ListItem { .. } => Parent::ListItem,
        _ => Parent::Other,
    }
}

fn node_name(node: &Node) -> &'static str {
    match node {
        Node::Section(_) => "section",
        Node::Paragraph { .. } => "paragraph",
        Node::ListItem { .. } => "list item",
        Node::Text { .. } => "text",
        Node::Emphasis { .. } => "emphasis",
        Node::Strong { .. } => "strong",
        Node::Literal { .. } => "literal",
        Node::Syntax { .. } | Node::LiteralBlock { .. } => "syntax block",
        Node::Definition(_) => "definition",
        Node::Reference(_) => "reference",
        Node::Inline { .. } => "inline",
        Node::Link { .. } => "link",
    }
}

/// Lint one document. `requires_ids` is false for documents that must
/// not carry paragraph ids at all.
pub fn check_document(document: &Document, prefix: &str, requires_ids: bool) -> Vec<LintFinding> {
    let mut linter = Linter {
        document: &document.name,
        prefix,
        findings: Vec::new(),
    };
    if requires_ids {
        if document.children.iter().any(|c| linter.is_id(c)) {
            linter.report("document should not have an id".to_owned());
        }
        for node in &document.children {
            linter.check_has_ids(node, Parent::Root);
        }
    } else {
        for node in &document.children {
            linter.check_does_not_have_ids(node);
        }
    }
    linter.findings
}
