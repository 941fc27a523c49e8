use crate::evaluator::EvalOptions;
use crate::stdlib::Library;
use crate::types::{Symbol, Value};
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("'{0}' not found")]
pub struct UnboundSymbol(pub Symbol);

/// One frame of bindings, chained to the frame it was spawned from.
///
/// Closures hold an `Rc` to the frame they were created in, so later `define`s in that frame are
/// visible to them.
pub struct Environment {
    frame: RefCell<HashMap<Symbol, Value>>,
    outer: Option<Rc<Environment>>,
    options: EvalOptions,
}

impl Environment {
    /// A session's root frame, populated from the primitive table.
    pub fn root(library: Library, options: EvalOptions) -> Rc<Self> {
        let frame = library
            .into_inner()
            .into_iter()
            .map(|(name, func)| (Symbol::new(name), Value::Primitive(func)))
            .collect();
        Rc::new(Self {
            frame: RefCell::new(frame),
            outer: None,
            options,
        })
    }

    pub fn spawn_from(outer: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            frame: RefCell::new(HashMap::new()),
            outer: Some(outer.clone()),
            options: outer.options,
        })
    }

    /// Child frame binding `parameters` to `args` by position. Unmatched parameters stay unbound
    /// and surplus arguments are dropped.
    pub fn extend(outer: &Rc<Self>, parameters: &[Symbol], args: &[Value]) -> Rc<Self> {
        let env = Self::spawn_from(outer);
        for (key, value) in parameters.iter().zip(args) {
            env.set(key.clone(), value.clone());
        }
        env
    }

    pub fn options(&self) -> EvalOptions {
        self.options
    }

    /// Binds in this frame only, returning the binding it replaced.
    pub fn set<T>(&self, key: T, value: Value) -> Option<Value>
    where
        T: Into<Symbol>,
    {
        self.frame.borrow_mut().insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        match self.frame.borrow().get(key) {
            Some(value) => Some(value.clone()),
            None => self.outer.as_ref().and_then(|outer| outer.get(key)),
        }
    }

    pub fn fetch(&self, key: &Symbol) -> Result<Value, UnboundSymbol> {
        self.get(key).ok_or_else(|| UnboundSymbol(key.clone()))
    }

    fn depth(&self) -> usize {
        match &self.outer {
            Some(outer) => 1 + outer.depth(),
            None => 0,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame at depth {}: {{{}}}",
            self.depth(),
            self.frame.borrow().keys().map(|s| s.as_str()).sorted().join(", ")
        )
    }
}
