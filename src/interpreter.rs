use crate::environment::Environment;
use crate::evaluator::{self, EvalOptions};
use crate::reader::{self, ReadError};
use crate::stdlib::Library;
use crate::types::{Node, Value};
use std::rc::Rc;
use thiserror::Error;

pub type Result<T = Value> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("read error: {0}")]
    Read(#[from] ReadError),
    #[error("{0}")]
    Eval(#[from] evaluator::Error),
}

pub fn read(line: &str) -> Result<Node> {
    reader::read_str(line).map_err(Error::Read)
}

pub fn eval(node: &Node, env: &Rc<Environment>) -> Result {
    evaluator::eval(node, env).map_err(Error::Eval)
}

/// Reads and evaluates one form.
pub fn rep(line: &str, env: &Rc<Environment>) -> Result {
    eval(&read(line)?, env)
}

/// A top-level environment that persists across inputs.
pub struct Session {
    env: Rc<Environment>,
}

impl Session {
    pub fn new(library: Library, options: EvalOptions) -> Self {
        Self {
            env: Environment::root(library, options),
        }
    }

    pub fn env(&self) -> &Rc<Environment> {
        &self.env
    }

    /// Evaluates every form in `text` in order and returns their values.
    ///
    /// Stops after a form evaluates to [`Value::Exit`], which is then the last value returned. An
    /// error discards the values before it; use [`Session::run`] to keep them.
    pub fn eval_text(&self, text: &str) -> Result<Vec<Value>> {
        self.run(text).into_result()
    }

    /// Like [`Session::eval_text`], but keeps the values produced before an error.
    ///
    /// Definitions made by earlier forms stay in the session either way.
    pub fn run(&self, text: &str) -> Outcome {
        let mut outcome = Outcome::default();
        let forms = match reader::read_all(text) {
            Ok(forms) => forms,
            Err(e) => {
                outcome.error = Some(e.into());
                return outcome;
            }
        };
        for form in &forms {
            match eval(form, &self.env) {
                Ok(value) => {
                    let exit = matches!(value, Value::Exit);
                    outcome.values.push(value);
                    if exit {
                        log::debug!("exit requested");
                        break;
                    }
                }
                Err(e) => {
                    outcome.error = Some(e);
                    break;
                }
            }
        }
        outcome
    }
}

/// What a source text produced: the values of the forms that ran, and the error that stopped it.
#[derive(Debug, Default)]
pub struct Outcome {
    pub values: Vec<Value>,
    pub error: Option<Error>,
}

impl Outcome {
    pub fn into_result(self) -> Result<Vec<Value>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.values),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Library::standard(), EvalOptions::default())
    }
}
