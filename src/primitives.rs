//! The primitive library that pre-populates the root scope.
//!
//! ```text
//! (+ 1 2 3)              ; variadic arithmetic, at least one argument
//! (/ 7 2)                ; `/` and `%` take exactly two
//! (= "a" "a")            ; structural equality
//! (cons 1 (quote (2 3))) ; list construction
//! (log "hello")          ; output
//! ```
//!
//! ## List coercion
//!
//! `cons`, `car` and `cdr` view every argument through one rule, [`coerce_to_list`]:
//! a list is its elements, `Nil` is the empty list, and any other value is a list
//! of one element. So `(car 5)` is `5`, `(cdr 5)` is `()`, `(car (quote ()))` is
//! `Nil` and `(cons 1 2)` is `(1 2)`.
//!
//! ## Adding New Primitives
//!
//! 1. Implement `fn(Vec<Value>) -> Result<Value, Error>`
//! 2. Add it to `PRIMITIVES` with its name and [`Arity`]
//!
//! Arity is validated by [`Primitive::call`] before the function runs, so
//! implementations may index their arguments directly.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::Error;
use crate::ast::{NumberType, Primitive, Value};
use crate::scope::Scope;

/// Accepted argument counts of a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    /// Inclusive range
    Range(usize, usize),
    Any,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::Any => true,
        }
    }

    /// Check `count` against this arity, naming `callee` in the error
    pub fn validate(self, callee: &str, count: usize) -> Result<(), Error> {
        if self.accepts(count) {
            Ok(())
        } else {
            Err(Error::arity(callee, self, count))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// Shared output sink written by `log`
pub type Output = Rc<RefCell<dyn Write>>;

/// An output sink writing to the process's stdout
pub fn stdout_output() -> Output {
    Rc::new(RefCell::new(std::io::stdout()))
}

/// View any value as a list: lists are themselves, `Nil` is empty, anything
/// else is a one-element list
pub fn coerce_to_list(value: Value) -> Vec<Value> {
    match value {
        Value::List(items) => items,
        Value::Nil => Vec::new(),
        other => vec![other],
    }
}

fn number(callee: &str, value: &Value) -> Result<NumberType, Error> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(Error::type_mismatch(
            callee,
            format!("expected number, got {} {other}", other.type_name()),
        )),
    }
}

//
// Primitive implementations
//

fn prim_eq(args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::Bool(args[0] == args[1]))
}

macro_rules! ordering_predicate {
    ($name:ident, $op:tt, $op_str:expr) => {
        fn $name(args: Vec<Value>) -> Result<Value, Error> {
            match (&args[0], &args[1]) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a $op b)),
                (Value::String(a), Value::String(b)) => Ok(Value::Bool(a $op b)),
                (a, b) => Err(Error::type_mismatch(
                    $op_str,
                    format!(
                        "cannot order {} and {}",
                        a.type_name(),
                        b.type_name()
                    ),
                )),
            }
        }
    };
}

ordering_predicate!(prim_lt, <, "<");
ordering_predicate!(prim_gt, >, ">");

/// Sums numbers, or concatenates when every argument is a string
fn prim_add(args: Vec<Value>) -> Result<Value, Error> {
    if args.iter().all(|arg| matches!(arg, Value::String(_))) {
        let mut result = String::new();
        for arg in &args {
            if let Value::String(s) = arg {
                result.push_str(s);
            }
        }
        return Ok(Value::String(result));
    }

    let mut sum = 0.0;
    for arg in &args {
        sum += number("+", arg)?;
    }
    Ok(Value::Number(sum))
}

macro_rules! numeric_reduction {
    ($name:ident, $op:tt, $op_str:expr) => {
        /// Left fold; a single argument is returned unchanged
        fn $name(args: Vec<Value>) -> Result<Value, Error> {
            let mut iter = args.iter();
            let mut acc = match iter.next() {
                Some(first) => number($op_str, first)?,
                None => return Err(Error::arity($op_str, Arity::AtLeast(1), 0)),
            };
            for arg in iter {
                acc = acc $op number($op_str, arg)?;
            }
            Ok(Value::Number(acc))
        }
    };
}

numeric_reduction!(prim_sub, -, "-");
numeric_reduction!(prim_mul, *, "*");
numeric_reduction!(prim_div, /, "/");
numeric_reduction!(prim_rem, %, "%");

fn prim_cons(args: Vec<Value>) -> Result<Value, Error> {
    let mut args = args.into_iter();
    let mut result = args.next().map(coerce_to_list).unwrap_or_default();
    result.extend(args.next().map(coerce_to_list).unwrap_or_default());
    Ok(Value::List(result))
}

fn prim_car(args: Vec<Value>) -> Result<Value, Error> {
    let list = args.into_iter().next().map(coerce_to_list).unwrap_or_default();
    Ok(list.into_iter().next().unwrap_or(Value::Nil))
}

fn prim_cdr(args: Vec<Value>) -> Result<Value, Error> {
    let list = args.into_iter().next().map(coerce_to_list).unwrap_or_default();
    Ok(Value::List(list.into_iter().skip(1).collect()))
}

type PrimitiveImpl = fn(Vec<Value>) -> Result<Value, Error>;

/// Registry of the pure primitives. `log` is bound separately since it
/// captures the output sink.
static PRIMITIVES: &[(&str, Arity, PrimitiveImpl)] = &[
    // Comparison
    ("=", Arity::Exact(2), prim_eq),
    ("<", Arity::Exact(2), prim_lt),
    (">", Arity::Exact(2), prim_gt),
    // Arithmetic
    ("+", Arity::AtLeast(1), prim_add),
    ("-", Arity::AtLeast(1), prim_sub),
    ("*", Arity::AtLeast(1), prim_mul),
    ("/", Arity::Exact(2), prim_div),
    ("%", Arity::Exact(2), prim_rem),
    // Lists
    ("cons", Arity::Exact(2), prim_cons),
    ("car", Arity::Exact(1), prim_car),
    ("cdr", Arity::Exact(1), prim_cdr),
];

/// Names bound by [`root_scope`], constants included
pub fn names() -> impl Iterator<Item = &'static str> {
    ["True", "False", "Nil", "log"]
        .into_iter()
        .chain(PRIMITIVES.iter().map(|(name, _, _)| *name))
}

/// Build the root scope: constants, the pure primitives, and `log` writing
/// to `output`
pub fn root_scope(output: Output) -> Scope {
    let scope = Scope::new();

    scope.define("True", Value::Bool(true));
    scope.define("False", Value::Bool(false));
    scope.define("Nil", Value::Nil);

    for (name, arity, func) in PRIMITIVES {
        scope.define(*name, Value::Primitive(Primitive::new(*name, *arity, *func)));
    }

    let log = Primitive::new("log", Arity::Exact(1), move |args: Vec<Value>| {
        let mut sink = output.borrow_mut();
        let written = match &args[0] {
            Value::String(s) => writeln!(sink, "{s}"),
            other => writeln!(sink, "{other}"),
        };
        written.map_err(|e| Error::OutputFailed(e.to_string()))?;
        Ok(Value::Unspecified)
    });
    scope.define("log", Value::Primitive(log));

    scope
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, sym, val};
    use pretty_assertions::assert_eq;

    fn call(scope: &Scope, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        match scope.lookup(name).unwrap() {
            Value::Primitive(p) => p.call(args),
            other => panic!("{name} is not a primitive: {other:?}"),
        }
    }

    /// Expected outcome of one primitive call
    #[derive(Debug)]
    enum Expect {
        Returns(Value),
        BadArity,
        BadType,
    }
    use Expect::*;

    #[test]
    fn test_primitives_data_driven() {
        let scope = root_scope(Rc::new(RefCell::new(Vec::<u8>::new())));

        let test_cases: Vec<(&str, Vec<Value>, Expect)> = vec![
            // === EQUALITY / ORDERING ===
            ("=", vec![val(1), val(1)], Returns(val(true))),
            ("=", vec![val(1), val("1")], Returns(val(false))),
            ("=", vec![val([1, 2]), val([1, 2])], Returns(val(true))),
            ("=", vec![Value::Nil, Value::Nil], Returns(val(true))),
            ("=", vec![val(1)], BadArity),
            ("<", vec![val(1), val(2)], Returns(val(true))),
            (">", vec![val(1), val(2)], Returns(val(false))),
            ("<", vec![val("a"), val("b")], Returns(val(true))),
            ("<", vec![val(1), val("b")], BadType),
            // === ARITHMETIC ===
            ("+", vec![val(1), val(2), val(3)], Returns(val(6))),
            ("+", vec![val(42)], Returns(val(42))),
            ("+", vec![val("ab"), val("cd")], Returns(val("abcd"))),
            ("+", vec![val(1), val("cd")], BadType),
            ("+", vec![], BadArity),
            ("-", vec![val(10), val(3), val(2)], Returns(val(5))),
            ("-", vec![val(10)], Returns(val(10))),
            ("*", vec![val(2), val(3), val(4)], Returns(val(24))),
            ("*", vec![], BadArity),
            ("/", vec![val(7), val(2)], Returns(val(3.5))),
            ("/", vec![val(1), val(2), val(3)], BadArity),
            ("%", vec![val(7), val(3)], Returns(val(1))),
            ("%", vec![val(-7), val(3)], Returns(val(-1))),
            ("%", vec![val(7)], BadArity),
            ("-", vec![sym("x")], BadType),
            // === LISTS ===
            ("cons", vec![val(1), val([2, 3])], Returns(val([1, 2, 3]))),
            ("cons", vec![val(1), val(2)], Returns(val([1, 2]))),
            ("cons", vec![val([1]), val([2])], Returns(val([1, 2]))),
            ("cons", vec![val(1), Value::Nil], Returns(val([1]))),
            ("car", vec![val([1, 2, 3])], Returns(val(1))),
            ("car", vec![nil()], Returns(Value::Nil)),
            ("car", vec![val(0)], Returns(val(0))),
            ("cdr", vec![val([1, 2, 3])], Returns(val([2, 3]))),
            ("cdr", vec![nil()], Returns(nil())),
            ("cdr", vec![val(5)], Returns(nil())),
            ("cdr", vec![], BadArity),
        ];

        for (i, (name, args, expected)) in test_cases.into_iter().enumerate() {
            let test_id = format!("#{} ({name} {args:?})", i + 1);
            match (call(&scope, name, args), expected) {
                (Ok(actual), Returns(expected)) => assert_eq!(actual, expected, "{test_id}"),
                (Err(Error::ArityMismatch { .. }), BadArity) => {}
                (Err(Error::TypeMismatch { .. }), BadType) => {}
                (actual, expected) => panic!("{test_id}: expected {expected:?}, got {actual:?}"),
            }
        }
    }

    #[test]
    fn test_constants_bound() {
        let scope = root_scope(Rc::new(RefCell::new(Vec::<u8>::new())));
        assert_eq!(scope.lookup("True").unwrap(), val(true));
        assert_eq!(scope.lookup("False").unwrap(), val(false));
        assert_eq!(scope.lookup("Nil").unwrap(), Value::Nil);
        for name in names() {
            assert!(scope.contains(name), "{name} missing from root scope");
        }
    }

    #[test]
    fn test_log_writes_display_form() {
        let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
        let scope = root_scope(buffer.clone());

        assert!(matches!(
            call(&scope, "log", vec![val("plain")]).unwrap(),
            Value::Unspecified
        ));
        call(&scope, "log", vec![val([val(1), val("a")])]).unwrap();
        call(&scope, "log", vec![val(2.5)]).unwrap();

        let written = String::from_utf8(buffer.borrow().clone()).unwrap();
        assert_eq!(written, "plain\n(1 \"a\")\n2.5\n");
    }

    #[test]
    fn test_arity_display() {
        assert_eq!(format!("{}", Arity::Exact(2)), "2");
        assert_eq!(format!("{}", Arity::AtLeast(1)), "at least 1");
        assert_eq!(format!("{}", Arity::Range(2, 3)), "2 to 3");
        assert!(Arity::Any.accepts(100));
        assert!(Arity::Range(2, 3).validate("if", 4).is_err());
    }
}
