//! Expression trees.
//!
//! The reader hands back [`Datum`] trees. Before evaluation each one is analysed
//! once into an [`Expr`], which decides which special form (if any) every list
//! represents. After analysis the evaluator dispatches on the enum variant and never
//! compares head symbols again.
//!
//! ## Special forms
//!
//! | form | arguments |
//! |---|---|
//! | `(quote datum)` | 1 |
//! | `(if test then [else])` | 2 or 3 |
//! | `(set! name value)` | 2 |
//! | `(define name value)` | 2 |
//! | `(lambda (params...) body)` | 2 |
//! | `(begin exprs...)` | any |
//! | ``(`bundle body)`` | 1 |
//!
//! Special-form names are recognised by position alone: a binding named `if` does
//! not stop `(if ...)` from being the conditional.
//!
//! Arity and shape are checked here, once per form, not when the form runs. A
//! malformed form is therefore an error even inside a branch that would never be
//! taken: `(if True 1 (quote))` fails with `ArityMismatch`.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

use crate::Error;
use crate::ast::{Datum, Value};
use crate::primitives::Arity;
use crate::stack::ensure_sufficient_stack;

/// Head symbols starting with this character name a bundle to import
pub const IMPORT_PREFIX: char = '`';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    Quote,
    If,
    Set,
    Define,
    Lambda,
    Begin,
}

/// Definition of a special form
#[derive(Debug)]
pub struct SpecialFormDef {
    pub name: &'static str,
    pub form: SpecialForm,
    /// Number of arguments after the head symbol
    pub arity: Arity,
}

static SPECIAL_FORMS: &[SpecialFormDef] = &[
    SpecialFormDef {
        name: "quote",
        form: SpecialForm::Quote,
        arity: Arity::Exact(1),
    },
    SpecialFormDef {
        name: "if",
        form: SpecialForm::If,
        arity: Arity::Range(2, 3),
    },
    SpecialFormDef {
        name: "set!",
        form: SpecialForm::Set,
        arity: Arity::Exact(2),
    },
    SpecialFormDef {
        name: "define",
        form: SpecialForm::Define,
        arity: Arity::Exact(2),
    },
    SpecialFormDef {
        name: "lambda",
        form: SpecialForm::Lambda,
        arity: Arity::Exact(2),
    },
    SpecialFormDef {
        name: "begin",
        form: SpecialForm::Begin,
        arity: Arity::Any,
    },
];

static SPECIAL_FORMS_BY_NAME: LazyLock<HashMap<&'static str, &'static SpecialFormDef>> =
    LazyLock::new(|| SPECIAL_FORMS.iter().map(|def| (def.name, def)).collect());

/// Find a special form by its head symbol
pub fn find_special_form(name: &str) -> Option<&'static SpecialFormDef> {
    SPECIAL_FORMS_BY_NAME.get(name).copied()
}

/// An analysed expression, ready for evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Number or string literal
    Literal(Value),
    /// Name resolved through the scope chain at evaluation time
    Symbol(String),
    /// Raw data with literal wrappers already stripped
    Quote(Value),
    If {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    Set {
        name: String,
        value: Box<Expr>,
    },
    Define {
        name: String,
        value: Box<Expr>,
    },
    /// Shared so that creating a closure does not copy the body
    Lambda {
        params: Rc<[String]>,
        body: Rc<Expr>,
    },
    Begin(Vec<Expr>),
    Import {
        bundle: String,
        body: Box<Expr>,
    },
    Apply {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Analyse a parsed datum into an expression
    pub fn analyze(datum: &Datum) -> Result<Expr, Error> {
        ensure_sufficient_stack(|| match datum {
            Datum::Number(n) => Ok(Expr::Literal(Value::Number(*n))),
            Datum::Str(s) => Ok(Expr::Literal(Value::String(s.clone()))),
            Datum::Symbol(name) => Ok(Expr::Symbol(name.clone())),
            Datum::List(items) => analyze_list(items),
        })
    }
}

fn analyze_list(items: &[Datum]) -> Result<Expr, Error> {
    let [head, args @ ..] = items else {
        // `()` is an application with nothing to apply
        return Ok(Expr::Apply {
            callee: Box::new(Expr::Literal(Value::List(Vec::new()))),
            args: Vec::new(),
        });
    };

    if let Datum::Symbol(name) = head {
        if let Some(def) = find_special_form(name) {
            def.arity.validate(def.name, args.len())?;
            return analyze_special_form(def.form, args);
        }

        if let Some(bundle) = name.strip_prefix(IMPORT_PREFIX)
            && !bundle.is_empty()
        {
            Arity::Exact(1).validate(name, args.len())?;
            return Ok(Expr::Import {
                bundle: bundle.to_owned(),
                body: Box::new(Expr::analyze(&args[0])?),
            });
        }
    }

    Ok(Expr::Apply {
        callee: Box::new(Expr::analyze(head)?),
        args: analyze_all(args)?,
    })
}

fn analyze_all(items: &[Datum]) -> Result<Vec<Expr>, Error> {
    items.iter().map(Expr::analyze).collect()
}

fn boxed(datum: &Datum) -> Result<Box<Expr>, Error> {
    Expr::analyze(datum).map(Box::new)
}

/// Arity has already been validated against the form's definition
fn analyze_special_form(form: SpecialForm, args: &[Datum]) -> Result<Expr, Error> {
    match (form, args) {
        (SpecialForm::Quote, [datum]) => Ok(Expr::Quote(datum.to_value())),

        (SpecialForm::If, [test, then, rest @ ..]) => Ok(Expr::If {
            test: boxed(test)?,
            then: boxed(then)?,
            otherwise: rest.first().map(boxed).transpose()?,
        }),

        (SpecialForm::Set, [target, value]) => Ok(Expr::Set {
            name: binding_name("set!", target)?,
            value: boxed(value)?,
        }),

        (SpecialForm::Define, [target, value]) => Ok(Expr::Define {
            name: binding_name("define", target)?,
            value: boxed(value)?,
        }),

        (SpecialForm::Lambda, [params, body]) => Ok(Expr::Lambda {
            params: lambda_params(params)?.into(),
            body: Rc::new(Expr::analyze(body)?),
        }),

        (SpecialForm::Begin, exprs) => Ok(Expr::Begin(analyze_all(exprs)?)),

        (form, args) => Err(Error::malformed(
            format!("{form:?}").to_lowercase(),
            format!("unexpected {} arguments", args.len()),
        )),
    }
}

fn binding_name(form: &str, target: &Datum) -> Result<String, Error> {
    target
        .as_symbol()
        .map(str::to_owned)
        .ok_or_else(|| Error::malformed(form, format!("expected a symbol, got {target}")))
}

fn lambda_params(params: &Datum) -> Result<Vec<String>, Error> {
    let Datum::List(items) = params else {
        return Err(Error::malformed(
            "lambda",
            format!("parameters must be a list, got {params}"),
        ));
    };

    let mut names: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let Some(name) = item.as_symbol() else {
            return Err(Error::malformed(
                "lambda",
                format!("parameter must be a symbol, got {item}"),
            ));
        };
        if names.iter().any(|existing| existing == name) {
            return Err(Error::malformed(
                "lambda",
                format!("duplicate parameter name: {name}"),
            ));
        }
        names.push(name.to_owned());
    }
    Ok(names)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, sym, val};
    use crate::reader::parse;
    use pretty_assertions::assert_eq;

    fn analyze_str(input: &str) -> Result<Expr, Error> {
        let forms = parse(input).unwrap();
        Expr::analyze(&forms[0])
    }

    fn symbol(name: &str) -> Box<Expr> {
        Box::new(Expr::Symbol(name.to_owned()))
    }

    fn literal<T: Into<Value>>(v: T) -> Box<Expr> {
        Box::new(Expr::Literal(v.into()))
    }

    #[test]
    fn test_special_form_registry() {
        let if_def = find_special_form("if").unwrap();
        assert_eq!(if_def.form, SpecialForm::If);
        assert_eq!(if_def.arity, Arity::Range(2, 3));
        assert_eq!(find_special_form("set!").unwrap().form, SpecialForm::Set);
        assert!(find_special_form("car").is_none());
    }

    #[test]
    fn test_analysis_data_driven() {
        let test_cases = vec![
            ("42", Expr::Literal(val(42))),
            ("\"s\"", Expr::Literal(val("s"))),
            ("x", Expr::Symbol("x".into())),
            (
                "(quote (1 \"a\" b ()))",
                Expr::Quote(val(vec![val(1), val("a"), sym("b"), nil()])),
            ),
            (
                "(if c 1 2)",
                Expr::If {
                    test: symbol("c"),
                    then: literal(1),
                    otherwise: Some(literal(2)),
                },
            ),
            (
                "(if c 1)",
                Expr::If {
                    test: symbol("c"),
                    then: literal(1),
                    otherwise: None,
                },
            ),
            (
                "(set! x 2)",
                Expr::Set {
                    name: "x".into(),
                    value: literal(2),
                },
            ),
            (
                "(define x 2)",
                Expr::Define {
                    name: "x".into(),
                    value: literal(2),
                },
            ),
            (
                "(lambda (a b) a)",
                Expr::Lambda {
                    params: vec!["a".to_owned(), "b".to_owned()].into(),
                    body: Rc::new(Expr::Symbol("a".into())),
                },
            ),
            ("(begin)", Expr::Begin(vec![])),
            (
                "(`math x)",
                Expr::Import {
                    bundle: "math".into(),
                    body: symbol("x"),
                },
            ),
            (
                "(f 1 x)",
                Expr::Apply {
                    callee: symbol("f"),
                    args: vec![Expr::Literal(val(1)), Expr::Symbol("x".into())],
                },
            ),
            (
                "()",
                Expr::Apply {
                    callee: literal(nil()),
                    args: vec![],
                },
            ),
            // A lone backtick is an ordinary symbol
            (
                "(` 1)",
                Expr::Apply {
                    callee: symbol("`"),
                    args: vec![Expr::Literal(val(1))],
                },
            ),
        ];

        for (input, expected) in test_cases {
            assert_eq!(analyze_str(input).unwrap(), expected, "analysis of {input}");
        }
    }

    #[test]
    fn test_malformed_forms() {
        let arity_cases = [
            "(quote)",
            "(quote a b)",
            "(if c)",
            "(if a b c d)",
            "(define x)",
            "(lambda (x))",
            "(`math)",
            // Checked even where evaluation would never reach
            "(if True 1 (quote))",
            "(lambda () (if False (set! x) 1))",
        ];
        for input in arity_cases {
            assert!(
                matches!(analyze_str(input), Err(Error::ArityMismatch { .. })),
                "{input} should be an arity error"
            );
        }

        let shape_cases = [
            ("(define 5 1)", "expected a symbol"),
            ("(set! \"x\" 1)", "expected a symbol"),
            ("(lambda x x)", "parameters must be a list"),
            ("(lambda (a 1) a)", "parameter must be a symbol"),
            ("(lambda (a a) a)", "duplicate parameter"),
        ];
        for (input, expected) in shape_cases {
            match analyze_str(input) {
                Err(Error::MalformedForm { message, .. }) => {
                    assert!(message.contains(expected), "{input}: {message}");
                }
                other => panic!("{input}: expected MalformedForm, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_nested_special_forms_are_analysed() {
        let expr = analyze_str("(begin (define f (lambda (n) (if n 1 0))) (f 1))").unwrap();
        let Expr::Begin(exprs) = expr else {
            panic!("expected begin");
        };
        assert!(matches!(
            &exprs[0],
            Expr::Define { value, .. } if matches!(value.as_ref(), Expr::Lambda { .. })
        ));
        assert!(matches!(&exprs[1], Expr::Apply { .. }));
    }
}
