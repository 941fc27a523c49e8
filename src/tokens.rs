use regex::Regex;
use std::fmt;

/// Keyword token standing in for the quote mark of a quoted list.
pub const QUOTE_KEYWORD: &str = "quote";

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum Token<'a> {
    OpenRoundBracket,
    CloseRoundBracket,
    PlainChars(&'a str),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenRoundBracket => write!(f, "("),
            Token::CloseRoundBracket => write!(f, ")"),
            Token::PlainChars(chars) => write!(f, "{}", chars),
        }
    }
}

/// Splits source text into tokens. Any text tokenizes; bracket balance is the reader's concern.
///
/// `'(` comes out as `(` followed by the `quote` keyword, so `'(a b)` and `(quote a b)` produce
/// the same tokens. Comments run from `;` to the end of the line and are dropped.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    lazy_static! {
        static ref TOKEN_RE: Regex = Regex::new(
            r#"(?x)                          # ignore whitespace in this pattern & allow comments
                '\(                          # quoted list
                |[()]                        # brackets
                |;[^\n]*                     # comments
                |[^\s();]+                   # one or more plain characters
            "#
        )
        .unwrap();
    }
    let mut tokens = Vec::new();
    for found in TOKEN_RE.find_iter(input) {
        match found.as_str() {
            "'(" => {
                tokens.push(Token::OpenRoundBracket);
                tokens.push(Token::PlainChars(QUOTE_KEYWORD));
            }
            "(" => tokens.push(Token::OpenRoundBracket),
            ")" => tokens.push(Token::CloseRoundBracket),
            comment if comment.starts_with(';') => {
                log::trace!("skipping comment {:?}", comment);
            }
            chars => tokens.push(Token::PlainChars(chars)),
        }
    }
    tokens
}
