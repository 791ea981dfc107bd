//! Capability bundles for the import form.
//!
//! ```text
//! (`math (sqrt 16))   ; evaluates (sqrt 16) in a child scope holding the `math` bundle
//! ```
//!
//! The interpreter never looks bundles up by itself: the host hands it a
//! [`BundleResolver`] when the [`Interpreter`](crate::Interpreter) is built, and the
//! import form asks that resolver for the named bindings.

use std::collections::HashMap;

use crate::Error;
use crate::ast::{NumberType, Primitive, Value};
use crate::primitives::Arity;

/// Named bindings a bundle contributes to the import scope
pub type Bundle = Vec<(String, Value)>;

/// Resolves bundle names to their bindings
pub trait BundleResolver {
    /// The bindings for `name`, or `None` if no such bundle exists
    fn resolve(&self, name: &str) -> Option<Bundle>;
}

/// Resolver that knows no bundles. Every import fails with `BundleNotFound`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBundles;

impl BundleResolver for NoBundles {
    fn resolve(&self, _name: &str) -> Option<Bundle> {
        None
    }
}

/// Any `Fn(&str) -> Option<Bundle>` is a resolver
impl<F> BundleResolver for F
where
    F: Fn(&str) -> Option<Bundle>,
{
    fn resolve(&self, name: &str) -> Option<Bundle> {
        self(name)
    }
}

/// A fixed table of bundles registered up front
#[derive(Default, Clone)]
pub struct BundleRegistry {
    bundles: HashMap<String, Bundle>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        BundleRegistry::default()
    }

    /// Register (or replace) the bundle `name`
    pub fn register(&mut self, name: impl Into<String>, bindings: Bundle) -> &mut Self {
        self.bundles.insert(name.into(), bindings);
        self
    }

    /// Registered bundle names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.bundles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl BundleResolver for BundleRegistry {
    fn resolve(&self, name: &str) -> Option<Bundle> {
        self.bundles.get(name).cloned()
    }
}

fn unary_math(name: &'static str, op: fn(NumberType) -> NumberType) -> (String, Value) {
    let primitive = Primitive::new(name, Arity::Exact(1), move |args: Vec<Value>| match &args[0] {
        Value::Number(n) => Ok(Value::Number(op(*n))),
        other => Err(Error::type_mismatch(
            name,
            format!("expected number, got {} {other}", other.type_name()),
        )),
    });
    (name.to_owned(), Value::Primitive(primitive))
}

/// The `math` bundle: `sqrt`, `floor` and the constant `pi`
pub fn math_bundle() -> Bundle {
    vec![
        unary_math("sqrt", NumberType::sqrt),
        unary_math("floor", NumberType::floor),
        ("pi".to_owned(), Value::Number(std::f64::consts::PI)),
    ]
}
