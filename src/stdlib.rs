use crate::environment::Environment;
use crate::evaluator::{self, Error};
use crate::special_forms::TRUE_MARKER;
use crate::types::{Arity, Int, PrimitiveFn, TypeMismatch, Value};
use derive_more::Deref;
use std::collections::HashMap;
use std::rc::Rc;

/// The primitive procedures a session's root frame starts with.
///
/// Built once by the caller and moved into [`Environment::root`]; there is no global table.
#[derive(Deref, Debug, Default)]
pub struct Library(HashMap<&'static str, &'static PrimitiveFn>);

impl Library {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        [&SUM, &DIFFERENCE, &PRODUCT, &EQUALS, &CONCAT, &CAR, &CDR, &CONS, &LEN]
            .iter()
            .fold(Self::empty(), |library, &func| library.with(func))
    }

    /// Adds or replaces a primitive under its own name.
    pub fn with(mut self, func: &'static PrimitiveFn) -> Self {
        self.0.insert(func.name, func);
        self
    }

    pub(crate) fn into_inner(self) -> HashMap<&'static str, &'static PrimitiveFn> {
        self.0
    }
}

fn grab_ints(args: &[Value]) -> evaluator::Result<Vec<Int>> {
    let type_check: Result<Vec<_>, _> = args.iter().map(|o| o.as_int()).collect();
    type_check.map_err(Error::TypeMismatch)
}

pub static SUM: PrimitiveFn = PrimitiveFn {
    name: "+",
    fn_ptr: sum_,
    arity: Arity::at_least(1),
};

fn sum_(args: &[Value], _env: &Rc<Environment>) -> evaluator::Result {
    grab_ints(args)?
        .iter()
        .try_fold(0 as Int, |acc, &x| acc.checked_add(x))
        .map(Value::Integer)
        .ok_or(Error::IntegerOverflow("+"))
}

pub static DIFFERENCE: PrimitiveFn = PrimitiveFn {
    name: "-",
    fn_ptr: difference_,
    arity: Arity::exactly(2),
};

fn difference_(args: &[Value], _env: &Rc<Environment>) -> evaluator::Result {
    let ints = grab_ints(args)?;
    ints[0]
        .checked_sub(ints[1])
        .map(Value::Integer)
        .ok_or(Error::IntegerOverflow("-"))
}

pub static PRODUCT: PrimitiveFn = PrimitiveFn {
    name: "*",
    fn_ptr: product_,
    arity: Arity::at_least(1),
};

fn product_(args: &[Value], _env: &Rc<Environment>) -> evaluator::Result {
    grab_ints(args)?
        .iter()
        .try_fold(1 as Int, |acc, &x| acc.checked_mul(x))
        .map(Value::Integer)
        .ok_or(Error::IntegerOverflow("*"))
}

/// Structural equality: same kind, same contents. Procedures are equal only to themselves.
pub static EQUALS: PrimitiveFn = PrimitiveFn {
    name: "=",
    fn_ptr: equals_,
    arity: Arity::exactly(2),
};

fn equals_(args: &[Value], _env: &Rc<Environment>) -> evaluator::Result {
    match args[0] == args[1] {
        true => Ok(Value::text(TRUE_MARKER)),
        false => Ok(Value::Nil),
    }
}

pub static CONCAT: PrimitiveFn = PrimitiveFn {
    name: "concat",
    fn_ptr: concat_,
    arity: Arity::at_least(1),
};

fn concat_(args: &[Value], _env: &Rc<Environment>) -> evaluator::Result {
    check_concatenable(&args[0])?;
    args[1..].iter().try_fold(args[0].clone(), concat_pair)
}

fn check_concatenable(value: &Value) -> evaluator::Result<()> {
    match value {
        Value::Text(_) | Value::List(_) | Value::Nil => Ok(()),
        other => Err(TypeMismatch::NotConcatenable(other.kind(), other.kind()).into()),
    }
}

fn concat_pair(acc: Value, next: &Value) -> evaluator::Result {
    use Value::*;
    match (&acc, next) {
        (Text(x), Text(y)) => Ok(Text(format!("{}{}", x, y))),
        (List(_), List(_)) | (List(_), Nil) | (Nil, List(_)) | (Nil, Nil) => {
            let mut joined = acc.as_seq()?.to_vec();
            joined.extend_from_slice(next.as_seq()?);
            Ok(Value::wrap_list(joined))
        }
        (x, y) => Err(TypeMismatch::NotConcatenable(x.kind(), y.kind()).into()),
    }
}

pub static CAR: PrimitiveFn = PrimitiveFn {
    name: "car",
    fn_ptr: car_,
    arity: Arity::exactly(1),
};

fn car_(args: &[Value], _env: &Rc<Environment>) -> evaluator::Result {
    let seq = args[0].as_seq()?;
    Ok(seq.first().cloned().unwrap_or(Value::Nil))
}

pub static CDR: PrimitiveFn = PrimitiveFn {
    name: "cdr",
    fn_ptr: cdr_,
    arity: Arity::exactly(1),
};

fn cdr_(args: &[Value], _env: &Rc<Environment>) -> evaluator::Result {
    let seq = args[0].as_seq()?;
    match seq.split_first() {
        Some((_, rest)) => Ok(Value::wrap_list(rest.to_vec())),
        None => Ok(Value::Nil),
    }
}

pub static CONS: PrimitiveFn = PrimitiveFn {
    name: "cons",
    fn_ptr: cons_,
    arity: Arity::exactly(2),
};

fn cons_(args: &[Value], _env: &Rc<Environment>) -> evaluator::Result {
    let head = &args[0];
    let tail = args[1].as_seq()?;

    let mut elements = Vec::with_capacity(tail.len() + 1);
    elements.push(head.clone());
    elements.extend_from_slice(tail);
    Ok(Value::wrap_list(elements))
}

pub static LEN: PrimitiveFn = PrimitiveFn {
    name: "len",
    fn_ptr: len_,
    arity: Arity::exactly(1),
};

fn len_(args: &[Value], _env: &Rc<Environment>) -> evaluator::Result {
    let len = match &args[0] {
        Value::Text(text) => text.chars().count(),
        Value::List(list) => list.len(),
        Value::Nil => 0,
        _ => return Err(TypeMismatch::NoLength.into()),
    };
    Ok(Value::Integer(len as Int))
}
