//! Lexer for the inline grammar notation used by `syntax` blocks.
//!
//! The notation is deliberately tiny: `$$...$$` literals, the `::=`
//! definition operator, identifiers, whitespace, and single characters.
//! Unterminated literals run to the end of the input.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Content between `$$` markers, without the markers
    Literal(String),
    /// `::=`
    Definition,
    /// Alphabetic start, then alphabetic or `_`
    Identifier(String),
    Whitespace(String),
    Other(char),
}

impl Token {
    /// Source text the token stands for when rendered as plain text.
    pub fn content(&self) -> String {
        match self {
            Token::Literal(s) | Token::Identifier(s) | Token::Whitespace(s) => s.clone(),
            Token::Definition => "::=".to_owned(),
            Token::Other(c) => c.to_string(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Literal(_) => "literal",
            Token::Definition => "definition",
            Token::Identifier(_) => "identifier",
            Token::Whitespace(_) => "whitespace",
            Token::Other(_) => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

pub fn lex(src: &str) -> Vec<Spanned> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let at = |i: usize| chars.get(i).copied();
    let mut pos = 0usize;
    let mut line: u32 = 1;

    while pos < chars.len() {
        let c = chars[pos];
        let tok_line = line;

        // Literal
        if c == '$' && at(pos + 1) == Some('$') {
            pos += 2;
            let mut s = String::new();
            while let Some(sc) = at(pos) {
                // A `$$` only closes when not followed by a third `$`, so
                // `$$$$$` is the literal `$` rather than an empty literal.
                if sc == '$' && at(pos + 1) == Some('$') && at(pos + 2) != Some('$') {
                    pos += 2;
                    break;
                }
                if sc == '\n' {
                    line += 1;
                }
                s.push(sc);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Literal(s),
                line: tok_line,
            });
            continue;
        }

        // Definition operator
        if c == ':' && at(pos + 1) == Some(':') && at(pos + 2) == Some('=') {
            pos += 3;
            tokens.push(Spanned {
                token: Token::Definition,
                line: tok_line,
            });
            continue;
        }

        // Identifier
        if c.is_alphabetic() {
            let start = pos;
            pos += 1;
            while pos < chars.len() && (chars[pos].is_alphabetic() || chars[pos] == '_') {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            tokens.push(Spanned {
                token: Token::Identifier(word),
                line: tok_line,
            });
            continue;
        }

        // Whitespace
        if c.is_whitespace() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_whitespace() {
                if chars[pos] == '\n' {
                    line += 1;
                }
                pos += 1;
            }
            let ws: String = chars[start..pos].iter().collect();
            tokens.push(Spanned {
                token: Token::Whitespace(ws),
                line: tok_line,
            });
            continue;
        }

        tokens.push(Spanned {
            token: Token::Other(c),
            line: tok_line,
        });
        pos += 1;
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        lex(src).into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn definition_line() {
        assert_eq!(
            kinds("Foo ::= $$bar$$ Baz"),
            vec![
                Token::Identifier("Foo".into()),
                Token::Whitespace(" ".into()),
                Token::Definition,
                Token::Whitespace(" ".into()),
                Token::Literal("bar".into()),
                Token::Whitespace(" ".into()),
                Token::Identifier("Baz".into()),
            ]
        );
    }

    #[test]
    fn greedy_literal_closing() {
        assert_eq!(kinds("$$$$$"), vec![Token::Literal("$".into())]);
        assert_eq!(kinds("$$$$"), vec![Token::Literal("".into())]);
    }

    #[test]
    fn unterminated_literal_absorbs_rest() {
        assert_eq!(
            kinds("$$abc ::= Def"),
            vec![Token::Literal("abc ::= Def".into())]
        );
    }

    #[test]
    fn identifiers_allow_inner_underscores() {
        assert_eq!(
            kinds("XID_Start _x"),
            vec![
                Token::Identifier("XID_Start".into()),
                Token::Whitespace(" ".into()),
                Token::Other('_'),
                Token::Identifier("x".into()),
            ]
        );
    }

    #[test]
    fn partial_operators_are_other() {
        assert_eq!(
            kinds("::|"),
            vec![Token::Other(':'), Token::Other(':'), Token::Other('|')]
        );
    }

    #[test]
    fn lines_are_tracked() {
        let toks = lex("A ::=\n  B\n$$x\ny$$ C");
        let c = toks
            .iter()
            .find(|s| s.token == Token::Identifier("C".into()))
            .unwrap();
        assert_eq!(c.line, 4);
    }
}
