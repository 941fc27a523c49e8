use crate::environment::Environment;
use crate::evaluator::{eval, NullTest, Result};
use crate::types::{truthy, Arity, Closure, Node, Symbol, Value};
use std::rc::Rc;
use thiserror::Error;

/// List heads with their own evaluation rule. Any other head is a procedure call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    Exit,
    Quote,
    NullTest,
    If,
    Cond,
    Lambda,
    Define,
}

impl SpecialForm {
    pub fn recognise(head: &Node) -> Option<Self> {
        let form = match head.as_symbol()?.as_str() {
            "exit" => Self::Exit,
            "quote" => Self::Quote,
            "null?" => Self::NullTest,
            "if" => Self::If,
            "cond?" => Self::Cond,
            "lambda" | "fn*" => Self::Lambda,
            "define" | "def!" => Self::Define,
            _ => return None,
        };
        Some(form)
    }
}

pub fn apply(form: SpecialForm, operands: &[Node], env: &Rc<Environment>) -> Result {
    log::trace!("apply special form {:?}", form);
    match form {
        SpecialForm::Exit => Ok(Value::Exit),
        SpecialForm::Quote => Ok(Value::wrap_list(
            operands.iter().map(Value::literal).collect(),
        )),
        SpecialForm::NullTest => apply_null_test(operands, env),
        SpecialForm::If => apply_if(operands, env),
        SpecialForm::Cond => apply_cond(operands, env),
        SpecialForm::Lambda => apply_lambda(operands, env),
        SpecialForm::Define => apply_define(operands, env),
    }
}

/// What `null?` and `=` return for yes. Prints as `'true`.
pub const TRUE_MARKER: &str = "'true";

pub fn apply_null_test(args: &[Node], env: &Rc<Environment>) -> Result {
    Arity::exactly(1).validate_for(args.len(), "null?")?;
    let is_null = match env.options().null_test {
        NullTest::Syntax => matches!(&args[0], Node::List(items) if items.is_empty()),
        NullTest::Value => eval(&args[0], env)?.is_nil(),
    };
    match is_null {
        true => Ok(Value::text(TRUE_MARKER)),
        false => Ok(Value::Nil),
    }
}

/// `(if predicate default alternative)`: `default` runs when the predicate is truthy.
pub fn apply_if(args: &[Node], env: &Rc<Environment>) -> Result {
    Arity::exactly(3).validate_for(args.len(), "if")?;
    let condition = eval(&args[0], env)?;
    if truthy(&condition) {
        eval(&args[1], env)
    } else {
        eval(&args[2], env)
    }
}

#[derive(Debug, Error)]
pub enum CondError {
    #[error("clause {0} is not a list")]
    ClauseNotAList(usize),
    #[error("clause {0} should hold a test and a body")]
    MalformedClause(usize),
}

/// `(cond? (test body) ...)`: evaluates the body of the first clause whose test is truthy.
/// `Nil` when no test passes. Clauses after the chosen one are neither checked nor evaluated.
pub fn apply_cond(clauses: &[Node], env: &Rc<Environment>) -> Result {
    for (i, clause) in clauses.iter().enumerate() {
        let (test, body) = match clause {
            Node::List(items) => match items.as_slice() {
                [test, body] => (test, body),
                _ => return Err(CondError::MalformedClause(i).into()),
            },
            _ => return Err(CondError::ClauseNotAList(i).into()),
        };
        if truthy(&eval(test, env)?) {
            return eval(body, env);
        }
    }
    Ok(Value::Nil)
}

#[derive(Debug, Error)]
pub enum LambdaError {
    #[error("expected a parameter list and a body, got {0} operand(s)")]
    WrongArgCount(usize),
    #[error("parameters must be given as a list")]
    ParametersNotGivenAsList,
    #[error("parameter {0} is not a symbol")]
    ParameterNotASymbol(usize),
}

pub fn apply_lambda(args: &[Node], env: &Rc<Environment>) -> Result {
    // Exactly two operands: a list of parameter symbols, then the single body expression.
    let (parameters, body) = match args {
        [parameters, body] => (parameters, body),
        _ => return Err(LambdaError::WrongArgCount(args.len()).into()),
    };
    let parameters = match parameters {
        Node::List(items) => items,
        _ => return Err(LambdaError::ParametersNotGivenAsList.into()),
    };
    let parameters = parameters
        .iter()
        .enumerate()
        .map(|(i, node)| {
            node.as_symbol()
                .cloned()
                .ok_or(LambdaError::ParameterNotASymbol(i))
        })
        .collect::<std::result::Result<Vec<Symbol>, _>>()?;

    let closure = Closure {
        parameters,
        body: body.clone(),
        parent: env.clone(),
    };
    Ok(Value::Closure(Rc::new(closure)))
}

#[derive(Debug, Error)]
pub enum DefineError {
    #[error("expected a name and a value, got {0} operand(s)")]
    WrongArgCount(usize),
    #[error("name is not a symbol")]
    KeyNotASymbol,
}

pub fn apply_define(args: &[Node], env: &Rc<Environment>) -> Result {
    let (key, value) = match args {
        [key, value] => (key, value),
        _ => return Err(DefineError::WrongArgCount(args.len()).into()),
    };
    let key = key
        .as_symbol()
        .ok_or(DefineError::KeyNotASymbol)?
        .binding_name();
    let value = eval(value, env)?;
    log::debug!("define {} as {}", key, value);
    env.set(key, value);
    Ok(Value::Void)
}
