//! Grammar-notation parser: turns a `syntax` block into display nodes with
//! grammar-category definition and reference markers.

use crate::ast::{Kind, Node};
use crate::lexer::{self, Spanned, Token};
use std::collections::VecDeque;

pub const SYNTAX_BLOCK_CLASS: &str = "spec-syntax";
pub const SYNTAX_LITERAL_CLASS: &str = "spec-syntax-literal";

struct Parser {
    tokens: VecDeque<Spanned>,
}

impl Parser {
    fn new(src: &str) -> Self {
        Parser {
            tokens: lexer::lex(src).into(),
        }
    }

    fn next(&mut self) -> Option<Token> {
        self.tokens.pop_front().map(|s| s.token)
    }

    fn peek_is(&self, nth: usize, f: impl Fn(&Token) -> bool) -> bool {
        self.tokens.get(nth).is_some_and(|s| f(&s.token))
    }

    /// `::=` follows, optionally after one whitespace token.
    fn followed_by_definition(&self) -> bool {
        let skip = usize::from(self.peek_is(0, |t| matches!(t, Token::Whitespace(_))));
        self.peek_is(skip, |t| *t == Token::Definition)
    }

    fn parse(mut self) -> Vec<Node> {
        let mut out = Vec::new();
        while let Some(token) = self.next() {
            let node = match token {
                Token::Literal(text) => Node::Inline {
                    ids: Vec::new(),
                    classes: vec![SYNTAX_LITERAL_CLASS.to_owned()],
                    children: vec![Node::Strong {
                        children: vec![Node::text(text)],
                    }],
                },
                Token::Identifier(name) if is_syntax_identifier(&name) => {
                    if self.followed_by_definition() {
                        Node::definition(Kind::GrammarCategory, name)
                    } else {
                        Node::reference(Kind::GrammarCategory, name)
                    }
                }
                other => Node::text(other.content()),
            };
            push_merging_text(&mut out, node);
        }
        out
    }
}

/// Adjacent text nodes are coalesced to keep rendered trees small.
fn push_merging_text(out: &mut Vec<Node>, node: Node) {
    if let (Some(Node::Text { text: last }), Node::Text { text }) = (out.last_mut(), &node) {
        last.push_str(text);
        return;
    }
    out.push(node);
}

/// Parse a grammar-notation block into display nodes.
pub fn parse(src: &str) -> Vec<Node> {
    Parser::new(src).parse()
}

/// Whether an identifier names a grammar category: an uppercase first
/// letter followed by a non-uppercase one (`Foo`, `FooBar`, `A`), after
/// dropping a leading `XID_`.
pub fn is_syntax_identifier(identifier: &str) -> bool {
    let identifier = identifier.strip_prefix("XID_").unwrap_or(identifier);
    let mut chars = identifier.chars();
    match chars.next() {
        None => true,
        Some(first) if !first.is_uppercase() => false,
        Some(_) => !chars.next().is_some_and(char::is_uppercase),
    }
}

/// Replace every `syntax` node in the tree with its parsed literal block.
pub fn expand_syntax_blocks(nodes: &mut [Node]) {
    for node in nodes.iter_mut() {
        if let Node::Syntax { text } = node {
            *node = Node::LiteralBlock {
                classes: vec![SYNTAX_BLOCK_CLASS.to_owned()],
                children: parse(text),
            };
        } else if let Some(children) = node.children_mut() {
            expand_syntax_blocks(children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_and_reference_markers() {
        let nodes = parse("Foo ::= $$bar$$ Baz");
        assert_eq!(nodes[0], Node::definition(Kind::GrammarCategory, "Foo"));
        assert_eq!(nodes[1], Node::text(" ::= "));
        assert!(matches!(
            &nodes[2],
            Node::Inline { classes, .. } if classes[0] == SYNTAX_LITERAL_CLASS
        ));
        assert_eq!(nodes[3], Node::text(" "));
        assert_eq!(nodes[4], Node::reference(Kind::GrammarCategory, "Baz"));
        assert_eq!(nodes.len(), 5);
    }

    #[test]
    fn definition_without_whitespace() {
        let nodes = parse("Foo::=Bar");
        assert_eq!(nodes[0], Node::definition(Kind::GrammarCategory, "Foo"));
        assert_eq!(nodes[2], Node::reference(Kind::GrammarCategory, "Bar"));
    }

    #[test]
    fn only_one_whitespace_token_is_skipped() {
        // A literal between the identifier and `::=` breaks the lookahead.
        let nodes = parse("Foo $$x$$ ::= Bar");
        assert_eq!(nodes[0], Node::reference(Kind::GrammarCategory, "Foo"));
    }

    #[test]
    fn non_grammar_identifiers_are_plain_text() {
        let nodes = parse("FOO ::= lower");
        assert_eq!(nodes, vec![Node::text("FOO ::= lower")]);
    }

    #[test]
    fn identifier_predicate() {
        assert!(is_syntax_identifier("Foo"));
        assert!(is_syntax_identifier("FooBar"));
        assert!(is_syntax_identifier("A"));
        assert!(is_syntax_identifier("XID_Start"));
        assert!(!is_syntax_identifier("FOO"));
        assert!(!is_syntax_identifier("foo"));
        assert!(!is_syntax_identifier("XID_start"));
    }

    #[test]
    fn expands_nested_syntax_blocks() {
        let mut nodes = vec![Node::ListItem {
            children: vec![Node::Syntax {
                text: "Item ::= Other".into(),
            }],
        }];
        expand_syntax_blocks(&mut nodes);
        let Node::ListItem { children } = &nodes[0] else {
            panic!("list item expected");
        };
        let Node::LiteralBlock { classes, children } = &children[0] else {
            panic!("literal block expected");
        };
        assert_eq!(classes, &vec![SYNTAX_BLOCK_CLASS.to_owned()]);
        assert_eq!(children[0], Node::definition(Kind::GrammarCategory, "Item"));
    }
}
