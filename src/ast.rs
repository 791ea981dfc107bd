//! Core data types. [`Datum`] is what the reader produces: a tree of literal
//! wrappers, symbols and lists, read-only once built. [`Value`] is what evaluation
//! produces and what scopes bind. The only bridge from one to the other outside of
//! ordinary evaluation is [`Datum::to_value`], used by `quote`.
//!
//! Ergonomic helpers [`val`], [`sym`] and [`nil`] build values in code and tests.

use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::expr::Expr;
use crate::primitives::Arity;
use crate::scope::Scope;

/// Type alias for number values in the interpreter
pub type NumberType = f64;

/// Parsed program text before special forms are recognised.
///
/// Number and string tokens are wrapped as literals at read time; every other
/// token is a bare symbol resolved during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Number(NumberType),
    Str(String),
    Symbol(String),
    List(Vec<Datum>),
}

impl Datum {
    /// Strip literal wrappers recursively, producing raw language data
    pub fn to_value(&self) -> Value {
        match self {
            Datum::Number(n) => Value::Number(*n),
            Datum::Str(s) => Value::String(s.clone()),
            Datum::Symbol(s) => Value::Symbol(s.clone()),
            Datum::List(items) => Value::List(items.iter().map(Datum::to_value).collect()),
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Datum::Symbol(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Number(n) => write!(f, "{n}"),
            // No escapes exist, so pick whichever quote the text does not contain
            Datum::Str(s) if s.contains('"') => write!(f, "'{s}'"),
            Datum::Str(s) => write!(f, "\"{s}\""),
            Datum::Symbol(s) => write!(f, "{s}"),
            Datum::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Canonical erased signature of a native function.
///
/// Primitives receive ownership of their evaluated arguments.
pub type PrimitiveFn = dyn Fn(Vec<Value>) -> Result<Value, Error>;

/// A native function bound in a scope
#[derive(Clone)]
pub struct Primitive {
    name: String,
    arity: Arity,
    func: Rc<PrimitiveFn>,
}

impl Primitive {
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        func: impl Fn(Vec<Value>) -> Result<Value, Error> + 'static,
    ) -> Self {
        Primitive {
            name: name.into(),
            arity,
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Validate the argument count, then run the native function
    pub fn call(&self, args: Vec<Value>) -> Result<Value, Error> {
        if !self.arity.accepts(args.len()) {
            return Err(Error::arity(&self.name, self.arity, args.len()));
        }
        (self.func)(args)
    }
}

/// A lambda paired with the scope it was created in
pub struct Closure {
    pub params: Rc<[String]>,
    pub body: Rc<Expr>,
    pub scope: Scope,
}

/// Runtime values
#[derive(Clone)]
pub enum Value {
    Number(NumberType),
    String(String),
    Symbol(String),
    Bool(bool),
    /// Quoted data and list results
    List(Vec<Value>),
    Closure(Rc<Closure>),
    Primitive(Primitive),
    Nil,
    /// Result of `define`/`set!`/`log`, and the binding of a parameter that
    /// received no argument. Equal only to itself.
    Unspecified,
}

impl Value {
    /// Everything except `False`, `Nil` and unspecified is true
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Nil | Value::Unspecified)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Primitive(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Bool(_) => "boolean",
            Value::List(_) => "list",
            Value::Closure(_) => "closure",
            Value::Primitive(_) => "primitive",
            Value::Nil => "nil",
            Value::Unspecified => "unspecified",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::List(list) => {
                write!(f, "List(")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                write!(f, ")")
            }
            Value::Closure(c) => write!(f, "Closure(params={:?})", &c.params[..]),
            Value::Primitive(p) => write!(f, "Primitive({})", p.name),
            Value::Nil => write!(f, "Nil"),
            Value::Unspecified => write!(f, "Unspecified"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::List(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            Value::Closure(_) => write!(f, "#<closure>"),
            Value::Primitive(p) => write!(f, "#<primitive:{}>", p.name),
            Value::Nil => write!(f, "Nil"),
            Value::Unspecified => write!(f, "#<unspecified>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Nil, Value::Nil) | (Value::Unspecified, Value::Unspecified) => true,
            // Callables compare by identity
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Primitive(a), Value::Primitive(b)) => Rc::ptr_eq(&a.func, &b.func),
            _ => false,
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NumberType> for Value {
    fn from(n: NumberType) -> Self {
        Value::Number(n)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(NumberType::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(Into::into).collect())
    }
}

/// Build a symbol value
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Build any value convertible with `Into<Value>`
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// The empty list
pub fn nil() -> Value {
    Value::List(vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_helper_functions_data_driven() {
        let test_cases = vec![
            (val(42), Value::Number(42.0)),
            (val(-17), Value::Number(-17.0)),
            (val(2.5), Value::Number(2.5)),
            (val(255u8), Value::Number(255.0)),
            (val(true), Value::Bool(true)),
            (val("hello"), Value::String("hello".to_owned())),
            (sym("set!"), Value::Symbol("set!".to_owned())),
            (nil(), Value::List(vec![])),
            (
                val([1, 2, 3]),
                Value::List(vec![
                    Value::Number(1.0),
                    Value::Number(2.0),
                    Value::Number(3.0),
                ]),
            ),
            (
                val(vec![sym("op"), val(42), val("result")]),
                Value::List(vec![
                    Value::Symbol("op".to_owned()),
                    Value::Number(42.0),
                    Value::String("result".to_owned()),
                ]),
            ),
        ];

        for (i, (actual, expected)) in test_cases.iter().enumerate() {
            assert_eq!(actual, expected, "case #{}", i + 1);
        }
    }

    #[test]
    fn test_quote_extraction_strips_wrappers() {
        let datum = Datum::List(vec![
            Datum::Number(1.0),
            Datum::Str("hi".into()),
            Datum::Symbol("x".into()),
            Datum::List(vec![]),
        ]);
        assert_eq!(datum.to_value(), val(vec![val(1), val("hi"), sym("x"), nil()]));
    }

    #[test]
    fn test_display() {
        let cases = vec![
            (val(42), "42"),
            (val(0.5), "0.5"),
            (val("hi"), "\"hi\""),
            (val(true), "True"),
            (Value::Nil, "Nil"),
            (val(vec![val(1), val(vec![sym("a")])]), "(1 (a))"),
        ];
        for (value, expected) in cases {
            assert_eq!(format!("{value}"), expected);
        }

        assert_eq!(format!("{}", Datum::Str("say \"x\"".into())), "'say \"x\"'");
    }

    #[test]
    fn test_truthiness_and_unspecified() {
        assert!(val(0).is_truthy());
        assert!(nil().is_truthy());
        assert!(!val(false).is_truthy());
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Unspecified.is_truthy());

        assert_eq!(Value::Unspecified, Value::Unspecified);
        assert_ne!(Value::Unspecified, Value::Nil);
        assert_ne!(Value::Unspecified, val(false));
    }
}
