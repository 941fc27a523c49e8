use crate::tokens::{tokenize, Token};
use crate::types::{Node, Symbol};
use std::iter::Peekable;
use std::slice;
use thiserror::Error;

pub type Reader<'a> = Peekable<slice::Iter<'a, Token<'a>>>;

pub type Result<T = Node> = std::result::Result<T, ReadError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadError {
    #[error("unexpected end of input: a list was never closed")]
    UnexpectedEndOfInput,
    #[error("unexpected ')'")]
    UnexpectedCloseParen,
    #[error("{0} unread token(s) after the first form")]
    TrailingInput(usize),
}

/// Reads exactly one form from `input`.
pub fn read_str(input: &str) -> Result {
    let tokens = tokenize(input);
    let mut reader = tokens.iter().peekable();
    let form = parse(&mut reader)?;
    match reader.peek() {
        None => Ok(form),
        Some(Token::CloseRoundBracket) => Err(ReadError::UnexpectedCloseParen),
        Some(_) => Err(ReadError::TrailingInput(reader.count())),
    }
}

/// Reads every form in `input`, in order.
pub fn read_all(input: &str) -> Result<Vec<Node>> {
    let tokens = tokenize(input);
    let mut reader = tokens.iter().peekable();
    let mut forms = Vec::new();
    while reader.peek().is_some() {
        forms.push(parse(&mut reader)?);
    }
    Ok(forms)
}

/// Reads one form from the front of `reader`, leaving any remaining tokens unconsumed.
pub fn parse(reader: &mut Reader) -> Result {
    match reader.next() {
        Some(Token::OpenRoundBracket) => read_list(reader).map(Node::List),
        Some(Token::CloseRoundBracket) => Err(ReadError::UnexpectedCloseParen),
        Some(Token::PlainChars(chars)) => Ok(read_atom(chars)),
        None => Err(ReadError::UnexpectedEndOfInput),
    }
}

fn read_list(reader: &mut Reader) -> Result<Vec<Node>> {
    let mut elements = Vec::new();
    loop {
        match reader.peek() {
            Some(Token::CloseRoundBracket) => {
                reader.next();
                break;
            }
            Some(_) => elements.push(parse(reader)?),
            None => return Err(ReadError::UnexpectedEndOfInput),
        }
    }
    Ok(elements)
}

/// Classifies a token as an integer literal or a symbol. Symbols keep any leading quote marker.
pub fn read_atom(chars: &str) -> Node {
    match chars.parse::<i64>() {
        Ok(n) => Node::Integer(n),
        Err(_) => Node::Symbol(Symbol::new(chars)),
    }
}
