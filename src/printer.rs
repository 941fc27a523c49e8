use crate::types::{Node, Value};
use itertools::Itertools;
use std::fmt;

pub fn pr_str(value: &Value) -> String {
    match value {
        Value::List(elements) => format!("({})", elements.iter().map(pr_str).join(" ")),
        Value::Integer(n) => n.to_string(),
        Value::Text(text) => text.clone(),
        Value::Nil => String::from("()"),
        Value::Primitive(f) => format!("#<primitive {}>", f.name),
        Value::Closure(c) => format!("#<closure ({})>", c.parameters.iter().join(" ")),
        Value::Void | Value::Exit => String::new(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", pr_str(self))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Integer(n) => write!(f, "{}", n),
            Node::Symbol(s) => write!(f, "{}", s),
            Node::List(items) => write!(f, "({})", items.iter().join(" ")),
        }
    }
}
