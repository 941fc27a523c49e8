use crate::environment::{Environment, UnboundSymbol};
use crate::special_forms::{self, SpecialForm};
use crate::types::{BadArgCount, Closure, Node, PrimitiveFn, TypeMismatch, Value};
use itertools::Itertools;
use std::rc::Rc;
use thiserror::Error;

pub type Result<T = Value> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    UnboundSymbol(#[from] UnboundSymbol),
    #[error("type mismatch: {0}")]
    TypeMismatch(#[from] TypeMismatch),
    #[error(transparent)]
    ArityMismatch(#[from] BadArgCount),
    #[error("integer overflow in {0}")]
    IntegerOverflow(&'static str),
    #[error("define: {0}")]
    Define(#[from] special_forms::DefineError),
    #[error("lambda: {0}")]
    Lambda(#[from] special_forms::LambdaError),
    #[error("cond?: {0}")]
    Cond(#[from] special_forms::CondError),
}

/// How `null?` treats its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullTest {
    /// Inspect the operand's syntax without evaluating it: only a literal `()` is null.
    Syntax,
    /// Evaluate the operand, then test the value for the empty list.
    Value,
}

/// What happens when a closure receives a different number of arguments than it has parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityPolicy {
    /// Bind by position; parameters without an argument stay unbound.
    Permissive,
    /// Fail with an arity error.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    pub null_test: NullTest,
    pub arity: ArityPolicy,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            null_test: NullTest::Syntax,
            arity: ArityPolicy::Permissive,
        }
    }
}

/// Evaluates `node` in `env`.
///
/// Plain recursion: nesting depth of the program is nesting depth of the native stack.
pub fn eval(node: &Node, env: &Rc<Environment>) -> Result {
    log::trace!("eval {}", node);
    match node {
        Node::Integer(n) => Ok(Value::Integer(*n)),
        Node::Symbol(s) => match s.strip_quote() {
            Some(text) => Ok(Value::text(text)),
            None => env.fetch(s).map_err(Error::UnboundSymbol),
        },
        Node::List(elements) => match elements.split_first() {
            None => Ok(Value::Nil),
            Some((head, operands)) => match SpecialForm::recognise(head) {
                Some(form) => special_forms::apply(form, operands, env),
                None => apply_call(head, operands, env),
            },
        },
    }
}

fn apply_call(head: &Node, operands: &[Node], env: &Rc<Environment>) -> Result {
    let callable = eval(head, env)?;
    let args = evaluate_sequence_elementwise(operands, env)?;
    apply(&callable, &args, env)
}

pub fn evaluate_sequence_elementwise(seq: &[Node], env: &Rc<Environment>) -> Result<Vec<Value>> {
    seq.iter().map(|node| eval(node, env)).collect()
}

/// Calls `callable` with already evaluated `args`. `env` is the caller's environment; only
/// primitives see it; closures run in a child of the frame they were created in.
pub fn apply(callable: &Value, args: &[Value], env: &Rc<Environment>) -> Result {
    match callable {
        Value::Primitive(f) => call_primitive(f, args, env),
        Value::Closure(f) => {
            let frame = make_closure_env(f, args)?;
            eval(&f.body, &frame)
        }
        _ => Err(Error::TypeMismatch(TypeMismatch::NotCallable)),
    }
}

pub(crate) fn pretty_print_args(args: &[Value]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => args[0].to_string(),
        _ => format!("\n\t{}", args.iter().join("\n\t")),
    }
}

pub fn call_primitive(func: &PrimitiveFn, args: &[Value], env: &Rc<Environment>) -> Result {
    func.arity.validate_for(args.len(), func.name)?;
    log::trace!("Call {} with {}", func.name, pretty_print_args(args));
    let result = (func.fn_ptr)(args, env);
    match &result {
        Ok(val) => log::trace!("Call to {} resulted in {}", func.name, val),
        Err(e) => log::trace!("Call to {} failed: {}", func.name, e),
    }
    result
}

fn make_closure_env(func: &Closure, args: &[Value]) -> Result<Rc<Environment>> {
    log::trace!("Call {:?} with {}", func, pretty_print_args(args));
    let expected = func.parameters.len();
    if func.parent.options().arity == ArityPolicy::Strict {
        crate::types::Arity::exactly(expected).validate_for(args.len(), "closure")?;
    } else if args.len() != expected {
        log::debug!(
            "closure takes {} parameters but got {} arguments; binding by position",
            expected,
            args.len()
        );
    }
    Ok(Environment::extend(&func.parent, &func.parameters, args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_str;
    use crate::stdlib::Library;
    use crate::types::Arity;
    use std::cell::Cell;

    fn run(src: &str, env: &Rc<Environment>) -> Result {
        eval(&read_str(src).unwrap(), env)
    }

    fn standard_env() -> Rc<Environment> {
        Environment::root(Library::standard(), EvalOptions::default())
    }

    fn list(values: Vec<Value>) -> Value {
        Value::wrap_list(values)
    }

    #[test]
    fn atoms() {
        let env = standard_env();
        assert_eq!(run("5", &env).unwrap(), Value::Integer(5));
        assert_eq!(run("'abc", &env).unwrap(), Value::text("abc"));
        assert_eq!(run("()", &env).unwrap(), Value::Nil);
        assert!(matches!(run("+", &env).unwrap(), Value::Primitive(_)));
    }

    #[test]
    fn quoted_symbols_are_never_looked_up() {
        let env = standard_env();
        env.set("x", Value::Integer(1));
        assert_eq!(run("'x", &env).unwrap(), Value::text("x"));
    }

    #[test]
    fn unbound_symbol() {
        let env = standard_env();
        match run("nowhere", &env) {
            Err(Error::UnboundSymbol(UnboundSymbol(s))) => assert_eq!(s.as_str(), "nowhere"),
            other => panic!("expected unbound symbol, got {:?}", other),
        }
    }

    #[test]
    fn arithmetic() {
        let env = standard_env();
        assert_eq!(run("(+ 7 -8)", &env).unwrap(), Value::Integer(-1));
        assert_eq!(run("(+ 1 2 3 4 5)", &env).unwrap(), Value::Integer(15));
        assert_eq!(run("(+ -3)", &env).unwrap(), Value::Integer(-3));
        assert_eq!(run("(+ 1 (+ 2 3))", &env).unwrap(), Value::Integer(6));
    }

    #[test]
    fn concatenation() {
        let env = standard_env();
        assert_eq!(run("(concat 'A 'B)", &env).unwrap(), Value::text("AB"));
        assert_eq!(run("(concat 'A 'B 'C)", &env).unwrap(), Value::text("ABC"));
        assert_eq!(
            run("(concat 'A 'B (concat 'C 'D))", &env).unwrap(),
            Value::text("ABCD")
        );
        assert_eq!(
            run("(concat 'A 'B ( concat 'E 'C) 'A (concat 'D 'L 'O))", &env).unwrap(),
            Value::text("ABECADLO")
        );
        assert!(matches!(
            run("(concat 'A 1)", &env),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn quote_returns_tail_unevaluated() {
        let env = standard_env();
        let expected = list(vec![Value::text("X"), Value::text("Y")]);
        assert_eq!(run("(quote X Y)", &env).unwrap(), expected);
        assert_eq!(run("'(X Y)", &env).unwrap(), expected);
        assert_eq!(
            run("(quote (+ 1 2) unbound)", &env).unwrap(),
            list(vec![
                list(vec![Value::text("+"), Value::Integer(1), Value::Integer(2)]),
                Value::text("unbound"),
            ])
        );
        assert_eq!(run("(quote)", &env).unwrap(), Value::Nil);
    }

    #[test]
    fn exit_is_a_value() {
        let env = standard_env();
        assert_eq!(run("(exit)", &env).unwrap(), Value::Exit);
    }

    #[test]
    fn calling_a_non_procedure() {
        let env = standard_env();
        assert!(matches!(
            run("(1 2)", &env),
            Err(Error::TypeMismatch(TypeMismatch::NotCallable))
        ));
        assert!(matches!(
            run("('foo)", &env),
            Err(Error::TypeMismatch(TypeMismatch::NotCallable))
        ));
    }

    #[test]
    fn lambda_application() {
        let env = standard_env();
        assert_eq!(
            run("((lambda (a b) (+ a b)) 1 2)", &env).unwrap(),
            Value::Integer(3)
        );
        assert_eq!(
            run("((fn* (a) (concat a 'b)) 'a)", &env).unwrap(),
            Value::text("ab")
        );
    }

    #[test]
    fn defined_lambda_sees_later_definitions() {
        let env = standard_env();
        assert_eq!(
            run("(define add (lambda (a b) (+ a b)))", &env).unwrap(),
            Value::Void
        );
        assert_eq!(run("(define y 2)", &env).unwrap(), Value::Void);
        assert_eq!(run("(add 1 y)", &env).unwrap(), Value::Integer(3));
    }

    #[test]
    fn closures_capture_defining_frame() {
        let env = standard_env();
        run(
            "(define adder (lambda (n) (lambda (m) (+ n m))))",
            &env,
        )
        .unwrap();
        run("(define add5 (adder 5))", &env).unwrap();
        assert_eq!(run("(add5 10)", &env).unwrap(), Value::Integer(15));
        // `n` only lives in the frame captured by add5.
        assert!(run("n", &env).is_err());
    }

    #[test]
    fn closures_do_not_see_caller_frame() {
        let env = standard_env();
        run("(define show (lambda () secret))", &env).unwrap();
        run("(define call (lambda (secret) (show)))", &env).unwrap();
        assert!(matches!(
            run("(call 1)", &env),
            Err(Error::UnboundSymbol(_))
        ));
    }

    #[test]
    fn permissive_arity_leaves_parameters_unbound() {
        let env = standard_env();
        run("(define second (lambda (a b) b))", &env).unwrap();
        assert!(matches!(
            run("(second 1)", &env),
            Err(Error::UnboundSymbol(_))
        ));
        run("(define first (lambda (a b) a))", &env).unwrap();
        assert_eq!(run("(first 1)", &env).unwrap(), Value::Integer(1));
        assert_eq!(run("(first 1 2 3)", &env).unwrap(), Value::Integer(1));
    }

    #[test]
    fn strict_arity_rejects_mismatch() {
        let options = EvalOptions {
            arity: ArityPolicy::Strict,
            ..EvalOptions::default()
        };
        let env = Environment::root(Library::standard(), options);
        run("(define first (lambda (a b) a))", &env).unwrap();
        assert!(matches!(
            run("(first 1)", &env),
            Err(Error::ArityMismatch(_))
        ));
        assert!(matches!(
            run("(first 1 2 3)", &env),
            Err(Error::ArityMismatch(_))
        ));
        assert_eq!(run("(first 1 2)", &env).unwrap(), Value::Integer(1));
    }

    thread_local! {
        static ADDITIONS: Cell<usize> = Cell::new(0);
        static CONCATENATIONS: Cell<usize> = Cell::new(0);
    }

    static STUB_ADD: PrimitiveFn = PrimitiveFn {
        name: "+",
        fn_ptr: |_, _| {
            ADDITIONS.with(|count| count.set(count.get() + 1));
            Ok(Value::Integer(100))
        },
        arity: Arity::at_least(0),
    };

    static STUB_CONCAT: PrimitiveFn = PrimitiveFn {
        name: "concat",
        fn_ptr: |_, _| {
            CONCATENATIONS.with(|count| count.set(count.get() + 1));
            Ok(Value::text("stub"))
        },
        arity: Arity::at_least(0),
    };

    fn stub_env() -> Rc<Environment> {
        ADDITIONS.with(|count| count.set(0));
        CONCATENATIONS.with(|count| count.set(0));
        let library = Library::empty().with(&STUB_ADD).with(&STUB_CONCAT);
        Environment::root(library, EvalOptions::default())
    }

    fn calls() -> (usize, usize) {
        (
            ADDITIONS.with(Cell::get),
            CONCATENATIONS.with(Cell::get),
        )
    }

    #[test]
    fn if_takes_default_branch_when_null() {
        let env = stub_env();
        let result = run("(if (null? ()) (+ 1 2) (concat '1 '2))", &env).unwrap();
        assert_eq!(result, Value::Integer(100));
        assert_eq!(calls(), (1, 0));
    }

    #[test]
    fn if_takes_alternative_branch_when_not_null() {
        let env = stub_env();
        let result = run("(if (null? ('foo)) (+ 1 2) (concat '1 '2))", &env).unwrap();
        assert_eq!(result, Value::text("stub"));
        assert_eq!(calls(), (0, 1));
    }

    #[test]
    fn primitives_receive_caller_environment() {
        static PEEK: PrimitiveFn = PrimitiveFn {
            name: "peek",
            fn_ptr: |_, env| Ok(env.get("local").unwrap_or(Value::Nil)),
            arity: Arity::exactly(0),
        };
        let env = Environment::root(Library::standard().with(&PEEK), EvalOptions::default());
        run("(define f (lambda (local) (peek)))", &env).unwrap();
        assert_eq!(run("(f 7)", &env).unwrap(), Value::Integer(7));
    }
}
