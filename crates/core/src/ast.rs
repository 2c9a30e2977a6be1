//! Document tree types shared by every pass.
//!
//! Trees are handed over by the host pipeline (or read from JSON by the
//! CLI) and rewritten in place by the resolution pass. Marker nodes carry
//! the raw text the author wrote; ids and targets are derived on demand so
//! a tree never holds a stale normalized id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a source document, e.g. `"lexical-elements"`.
pub type DocumentId = String;

// ──────────────────────────────────────────────
// Kinds
// ──────────────────────────────────────────────

/// The four independent id namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Paragraph,
    #[serde(rename = "syntax")]
    GrammarCategory,
    #[serde(rename = "term")]
    GlossaryTerm,
    #[serde(rename = "code")]
    CodeConstruct,
}

impl Kind {
    pub const ALL: [Kind; 4] = [
        Kind::Paragraph,
        Kind::GrammarCategory,
        Kind::GlossaryTerm,
        Kind::CodeConstruct,
    ];

    /// Name used in serialized output and in the objects inventory.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Paragraph => "paragraph",
            Kind::GrammarCategory => "syntax",
            Kind::GlossaryTerm => "term",
            Kind::CodeConstruct => "code",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ──────────────────────────────────────────────
// Nodes
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Section(Section),
    Paragraph {
        children: Vec<Node>,
    },
    ListItem {
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Emphasis {
        children: Vec<Node>,
    },
    Strong {
        children: Vec<Node>,
    },
    Literal {
        text: String,
    },
    /// Raw grammar notation, expanded into a `LiteralBlock` during the read phase.
    Syntax {
        text: String,
    },
    LiteralBlock {
        #[serde(default)]
        classes: Vec<String>,
        children: Vec<Node>,
    },
    Definition(DefinitionMarker),
    Reference(ReferenceMarker),
    Inline {
        #[serde(default)]
        ids: Vec<String>,
        #[serde(default)]
        classes: Vec<String>,
        children: Vec<Node>,
    },
    Link {
        document: DocumentId,
        anchor: String,
        children: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Section {
    /// Anchor used to key section numbers and build links.
    pub fn anchor(&self) -> String {
        match &self.id {
            Some(id) => format!("#{}", id),
            None => format!("#{}", id_from_text(&self.title)),
        }
    }

    /// The stable id, if this section carries one with the project prefix.
    pub fn stable_id(&self, prefix: &str) -> Option<&str> {
        self.id.as_deref().filter(|id| id.starts_with(prefix))
    }
}

/// Text that introduces a new item of some kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionMarker {
    pub kind: Kind,
    pub text: String,
}

impl DefinitionMarker {
    pub fn new(kind: Kind, text: impl Into<String>) -> Self {
        DefinitionMarker {
            kind,
            text: text.into(),
        }
    }

    pub fn id(&self) -> String {
        id_from_text(&self.text)
    }
}

/// Text pointing at an item that may be defined anywhere in the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMarker {
    pub kind: Kind,
    pub text: String,
}

impl ReferenceMarker {
    pub fn new(kind: Kind, text: impl Into<String>) -> Self {
        ReferenceMarker {
            kind,
            text: text.into(),
        }
    }

    pub fn display_text(&self) -> String {
        split_reference(&self.text).0
    }

    pub fn target(&self) -> String {
        split_reference(&self.text).1
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Node {
        Node::Text { text: text.into() }
    }

    pub fn paragraph(children: Vec<Node>) -> Node {
        Node::Paragraph { children }
    }

    pub fn definition(kind: Kind, text: impl Into<String>) -> Node {
        Node::Definition(DefinitionMarker::new(kind, text))
    }

    pub fn reference(kind: Kind, text: impl Into<String>) -> Node {
        Node::Reference(ReferenceMarker::new(kind, text))
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Section(s) => &s.children,
            Node::Paragraph { children }
            | Node::ListItem { children }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::LiteralBlock { children, .. }
            | Node::Inline { children, .. }
            | Node::Link { children, .. } => children,
            Node::Text { .. }
            | Node::Literal { .. }
            | Node::Syntax { .. }
            | Node::Definition(_)
            | Node::Reference(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Section(s) => Some(&mut s.children),
            Node::Paragraph { children }
            | Node::ListItem { children }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::LiteralBlock { children, .. }
            | Node::Inline { children, .. }
            | Node::Link { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Plain-text rendering of the node and its descendants.
    pub fn astext(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Node::Section(s) => {
                out.push_str(&s.title);
                for c in &s.children {
                    c.write_text(out);
                }
            }
            Node::Text { text } | Node::Literal { text } | Node::Syntax { text } => {
                out.push_str(text)
            }
            Node::Definition(d) => out.push_str(&d.text),
            Node::Reference(r) => out.push_str(&r.display_text()),
            other => {
                for c in other.children() {
                    c.write_text(out);
                }
            }
        }
    }
}

/// A parsed source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: DocumentId,
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(name: impl Into<DocumentId>, children: Vec<Node>) -> Self {
        Document {
            name: name.into(),
            children,
        }
    }

    /// Title of the first top-level section, if any.
    pub fn title(&self) -> Option<&str> {
        self.children.iter().find_map(|n| match n {
            Node::Section(s) => Some(s.title.as_str()),
            _ => None,
        })
    }
}

// ──────────────────────────────────────────────
// Ids
// ──────────────────────────────────────────────

/// Canonical id normalization: lowercase, then every non-alphanumeric
/// character becomes `_`.
pub fn id_from_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Split raw reference text into `(display, normalized target)`.
///
/// `Display <target>` uses the angle-bracketed part as the target.
/// `[target]s` marks the target inline and drops the brackets from the
/// display text. Anything else is both display and target.
pub fn split_reference(text: &str) -> (String, String) {
    if text.ends_with('>') {
        if let Some(start) = text.rfind('<') {
            let target = &text[start + 1..text.len() - 1];
            let display = text[..start].trim_end();
            return (display.to_owned(), id_from_text(target));
        }
    }
    if let (Some(open), Some(close)) = (text.find('['), text.rfind(']')) {
        if open < close {
            let target = &text[open + 1..close];
            let display: String = text.chars().filter(|c| *c != '[' && *c != ']').collect();
            return (display, id_from_text(target));
        }
    }
    (text.to_owned(), id_from_text(text))
}
