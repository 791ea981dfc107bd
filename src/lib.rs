//! Jive - a minimal Lisp-family interpreter
//!
//! This crate reads parenthesized program text, turns it into a nested expression
//! tree and evaluates that tree against a chain of lexical scopes.
//!
//! ```text
//! (begin
//!   (define square (lambda (x) (* x x)))
//!   (square 12))          ; => 144
//! ```
//!
//! ## Pipeline
//!
//! text → [`reader`] → [`ast::Datum`] tree → [`expr::Expr`] (special forms decided once)
//! → [`evaluator::Interpreter::evaluate`] against a [`scope::Scope`] → [`ast::Value`]
//!
//! ## Special forms
//!
//! `quote`, `if`, `set!`, `define`, `lambda`, `begin`, and the bundle import form
//! ``(`name body)`` which evaluates `body` in a child scope populated by a capability
//! bundle supplied by the host (see [`bundle`]).
//!
//! ## Modules
//!
//! - `reader`: parenthesized text to literal-wrapped trees
//! - `expr`: closed expression enum and special-form analysis
//! - `evaluator`: the recursive evaluation engine
//! - `scope`: lexical scope chain
//! - `primitives`: the root scope library (arithmetic, comparison, lists, output)
//! - `bundle`: capability bundles for the import form
//! - `config`: depth limits

use std::fmt;

/// Default maximum evaluation depth before `RecursionLimitExceeded` is reported
pub const DEFAULT_MAX_EVAL_DEPTH: usize = 10_000;

/// Default maximum list nesting accepted by the reader
pub const DEFAULT_MAX_PARSE_DEPTH: usize = 1_000;

/// Why the reader rejected the input as unbalanced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnbalancedKind {
    /// Text ended while a list was still open
    Unclosed,
    /// A `)` appeared with no list open
    UnexpectedClose,
}

impl fmt::Display for UnbalancedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnbalancedKind::Unclosed => write!(f, "unexpected end of input inside a list"),
            UnbalancedKind::UnexpectedClose => write!(f, "unexpected ')'"),
        }
    }
}

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("UnbalancedInput: {kind} at offset {offset}\nContext: {context}")]
    UnbalancedInput {
        kind: UnbalancedKind,
        offset: usize,
        /// Snippet of the input around the offset (max 100 chars)
        context: String,
    },

    #[error("NameNotFound: {0}")]
    NameNotFound(String),

    #[error("NotCallable: cannot apply {0}")]
    NotCallable(String),

    #[error("ArityMismatch: {callee} expected {expected} arguments, got {got}")]
    ArityMismatch {
        callee: String,
        expected: primitives::Arity,
        got: usize,
    },

    #[error("RecursionLimitExceeded: nesting deeper than {limit}")]
    RecursionLimitExceeded { limit: usize },

    #[error("MalformedForm: {form}: {message}")]
    MalformedForm { form: String, message: String },

    #[error("TypeMismatch: {callee}: {message}")]
    TypeMismatch { callee: String, message: String },

    #[error("BundleNotFound: {0}")]
    BundleNotFound(String),

    /// Writing to the output sink of `log` failed
    #[error("OutputFailed: {0}")]
    OutputFailed(String),
}

impl Error {
    /// Create an ArityMismatch for the named callee
    pub fn arity(callee: impl Into<String>, expected: primitives::Arity, got: usize) -> Self {
        Error::ArityMismatch {
            callee: callee.into(),
            expected,
            got,
        }
    }

    pub fn malformed(form: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedForm {
            form: form.into(),
            message: message.into(),
        }
    }

    pub fn type_mismatch(callee: impl Into<String>, message: impl Into<String>) -> Self {
        Error::TypeMismatch {
            callee: callee.into(),
            message: message.into(),
        }
    }

    /// Create an UnbalancedInput error with a context snippet extracted from
    /// `input` around the byte offset where the reader gave up
    pub fn unbalanced(kind: UnbalancedKind, input: &str, offset: usize) -> Self {
        const MAX_CONTEXT: usize = 100;

        // Show a little of what came before the failure point
        let context_start = offset.saturating_sub(20);
        let context_start = (0..=context_start)
            .rev()
            .find(|&i| input.is_char_boundary(i))
            .unwrap_or(0);

        let context_str: String = input[context_start..].chars().take(MAX_CONTEXT).collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.len() < input.len() {
            display_context.push_str("[...]");
        }

        let context = display_context.replace('\n', "\\n").replace('\r', "");

        Error::UnbalancedInput {
            kind,
            offset,
            context,
        }
    }
}

pub mod ast;
pub mod bundle;
pub mod config;
pub mod evaluator;
pub mod expr;
pub mod primitives;
pub mod reader;
pub mod scope;

mod stack;

pub use config::Config;
pub use evaluator::Interpreter;
pub use scope::Scope;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unbalanced_context_snippet() {
        let short = Error::unbalanced(UnbalancedKind::Unclosed, "(+ 1 2", 6);
        assert_eq!(
            short,
            Error::UnbalancedInput {
                kind: UnbalancedKind::Unclosed,
                offset: 6,
                context: "(+ 1 2".to_owned(),
            }
        );

        let long_input = format!("{}\n(oops", "x ".repeat(40));
        let Error::UnbalancedInput { context, .. } =
            Error::unbalanced(UnbalancedKind::Unclosed, &long_input, long_input.len())
        else {
            panic!("expected UnbalancedInput");
        };
        assert!(context.starts_with("[...]"));
        assert!(context.contains("\\n(oops"));
    }

    #[test]
    fn test_error_display() {
        let cases = vec![
            (Error::NameNotFound("x".into()), "NameNotFound: x"),
            (Error::NotCallable("1".into()), "NotCallable: cannot apply 1"),
            (
                Error::arity("/", primitives::Arity::Exact(2), 3),
                "ArityMismatch: / expected 2 arguments, got 3",
            ),
            (
                Error::arity("+", primitives::Arity::AtLeast(1), 0),
                "ArityMismatch: + expected at least 1 arguments, got 0",
            ),
            (
                Error::RecursionLimitExceeded { limit: 64 },
                "RecursionLimitExceeded: nesting deeper than 64",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(format!("{error}"), expected);
        }
    }
}
