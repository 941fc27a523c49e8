use crate::environment::Environment;
use crate::evaluator;
use derive_more::{Deref, DerefMut};
use std::borrow::Borrow;
use std::fmt;
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;
use thiserror::Error;

pub type Int = i64;

/// Marks a symbol token as a literal rather than a name to look up.
pub const QUOTE_MARKER: char = '\'';

#[derive(Deref, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Self(String::from(name))
    }

    /// The symbol text without its leading quote marker, if it has one.
    pub fn strip_quote(&self) -> Option<&str> {
        self.0.strip_prefix(QUOTE_MARKER)
    }

    /// The name this symbol binds under: quote marker removed when present.
    pub fn binding_name(&self) -> Symbol {
        match self.strip_quote() {
            Some(name) => Symbol::new(name),
            None => self.clone(),
        }
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node of the syntax tree produced by the reader.
///
/// Whether a list is a special form or an application is only decided when it is evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Integer(Int),
    Symbol(Symbol),
    List(Vec<Node>),
}

impl Node {
    pub fn symbol(name: &str) -> Self {
        Node::Symbol(Symbol::new(name))
    }

    pub(crate) fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Node::Symbol(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug, Error)]
#[error("When evaluating {name} expected {expected} arguments, but received {got} arguments")]
pub struct BadArgCount {
    name: &'static str,
    expected: Arity,
    got: usize,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub(crate) fn validate_for(&self, n: usize, name: &'static str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name,
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

/// A procedure implemented in Rust. Receives the evaluated arguments and the caller's environment.
pub struct PrimitiveFn {
    pub name: &'static str,
    pub arity: Arity,
    pub fn_ptr: fn(&[Value], &Rc<Environment>) -> evaluator::Result,
}

impl fmt::Debug for PrimitiveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "primitive function #<{}>", self.name)
    }
}

pub struct Closure {
    pub parameters: Vec<Symbol>,
    pub body: Node,
    pub parent: Rc<Environment>,
}

impl fmt::Debug for Closure {
    // Not derived because we want to skip the parent: the parent may well contain this Closure!
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Closure{{parameters: {:?}, body: {:?}}}",
            self.parameters, self.body
        )
    }
}

#[derive(Deref, DerefMut, Debug, PartialEq)]
pub struct List(pub Vec<Value>);

#[derive(Debug, Clone)]
pub enum Value {
    /// The empty list. Doubles as the falsy sentinel.
    Nil,
    Integer(Int),
    Text(String),
    /// Always non-empty; see [`Value::wrap_list`].
    List(Rc<List>),
    Primitive(&'static PrimitiveFn),
    Closure(Rc<Closure>),
    /// The result of `define`: nothing to show, keep going.
    Void,
    /// Asks whoever drives the evaluator to end the session.
    Exit,
}

pub(crate) fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Nil | Value::Void)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeMismatch {
    #[error("expected an integer")]
    NotAnInt,
    #[error("expected a list")]
    NotAList,
    #[error("value has no length")]
    NoLength,
    #[error("value is not callable")]
    NotCallable,
    #[error("cannot concatenate {0} with {1}")]
    NotConcatenable(&'static str, &'static str),
}

impl Value {
    /// Wraps elements as a list value; no elements gives `Nil`.
    pub fn wrap_list(elements: Vec<Value>) -> Self {
        match elements.is_empty() {
            true => Value::Nil,
            false => Value::List(Rc::new(List(elements))),
        }
    }

    pub fn text(chars: &str) -> Self {
        Value::Text(String::from(chars))
    }

    /// Converts unevaluated syntax to a literal value. Symbols keep their raw token text.
    pub fn literal(node: &Node) -> Self {
        match node {
            Node::Integer(n) => Value::Integer(*n),
            Node::Symbol(s) => Value::Text(s.0.clone()),
            Node::List(items) => Value::wrap_list(items.iter().map(Value::literal).collect()),
        }
    }

    pub(crate) fn as_int(&self) -> Result<Int, TypeMismatch> {
        match self {
            Value::Integer(x) => Ok(*x),
            _ => Err(TypeMismatch::NotAnInt),
        }
    }

    pub(crate) fn as_seq(&self) -> Result<&[Value], TypeMismatch> {
        match self {
            Value::List(x) => Ok(x.as_slice()),
            Value::Nil => Ok(&[]),
            _ => Err(TypeMismatch::NotAList),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Primitive(_) => "primitive",
            Value::Closure(_) => "closure",
            Value::Void => "void",
            Value::Exit => "exit",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(x), Value::Integer(y)) => x == y,
            (Value::Text(x), Value::Text(y)) => x == y,
            (Value::List(x), Value::List(y)) => x == y,
            (Value::Primitive(x), Value::Primitive(y)) => std::ptr::eq(*x, *y),
            (Value::Closure(x), Value::Closure(y)) => Rc::ptr_eq(x, y),
            (Value::Nil, Value::Nil) | (Value::Void, Value::Void) | (Value::Exit, Value::Exit) => {
                true
            }
            (_, _) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_nil() {
        assert_eq!(Value::wrap_list(Vec::new()), Value::Nil);
        assert!(!truthy(&Value::wrap_list(Vec::new())));
    }

    #[test]
    fn literal_keeps_raw_symbol_text() {
        let node = Node::List(vec![
            Node::symbol("x"),
            Node::symbol("'y"),
            Node::Integer(3),
            Node::List(vec![]),
        ]);
        let expected = Value::wrap_list(vec![
            Value::text("x"),
            Value::text("'y"),
            Value::Integer(3),
            Value::Nil,
        ]);
        assert_eq!(Value::literal(&node), expected);
    }

    #[test]
    fn binding_name_strips_quote_marker() {
        assert_eq!(Symbol::new("'add").binding_name(), Symbol::new("add"));
        assert_eq!(Symbol::new("add").binding_name(), Symbol::new("add"));
    }

    #[test]
    fn arity_reports_mismatch() {
        assert!(Arity::exactly(2).validate_for(2, "f").is_ok());
        assert!(Arity::at_least(1).validate_for(0, "f").is_err());
        let err = Arity::exactly(1).validate_for(3, "car").unwrap_err();
        assert_eq!(
            err.to_string(),
            "When evaluating car expected exactly 1 arguments, but received 3 arguments"
        );
    }

    #[test]
    fn void_and_nil_are_falsy() {
        assert!(!truthy(&Value::Void));
        assert!(!truthy(&Value::Nil));
        assert!(truthy(&Value::Integer(0)));
        assert!(truthy(&Value::text("")));
    }
}
