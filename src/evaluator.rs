//! The evaluation engine.
//!
//! An [`Interpreter`] holds the evaluation limits and the host's bundle resolver.
//! It owns no bindings: every call takes the [`Scope`] to evaluate against, so a
//! host can keep one root scope alive across several units of program text.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::Error;
use crate::ast::{Closure, Value};
use crate::bundle::{BundleResolver, NoBundles};
use crate::config::Config;
use crate::expr::Expr;
use crate::primitives::{root_scope, stdout_output};
use crate::reader::parse_with_config;
use crate::scope::Scope;
use crate::stack::ensure_sufficient_stack;

/// Create a root scope whose `log` writes to stdout
pub fn create_root_scope() -> Scope {
    root_scope(stdout_output())
}

pub struct Interpreter {
    config: Config,
    bundles: Box<dyn BundleResolver>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    /// Interpreter with default limits and no bundles
    pub fn new() -> Self {
        Interpreter::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Interpreter {
            config,
            bundles: Box::new(NoBundles),
        }
    }

    /// Replace the resolver consulted by the import form
    pub fn with_bundles(mut self, resolver: impl BundleResolver + 'static) -> Self {
        self.bundles = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read and analyse every top-level form in `text`
    pub fn parse(&self, text: &str) -> Result<Vec<Expr>, Error> {
        parse_with_config(text, &self.config)?
            .iter()
            .map(Expr::analyze)
            .collect()
    }

    /// Evaluate all top-level forms in order, returning the value of the last.
    /// An empty program evaluates to `Unspecified`.
    pub fn run(&self, text: &str, scope: &Scope) -> Result<Value, Error> {
        let mut result = Value::Unspecified;
        for expr in self.parse(text)? {
            result = self.evaluate(&expr, scope)?;
        }
        Ok(result)
    }

    /// Evaluate only the first top-level form of a unit. The whole text is read,
    /// so unbalanced input anywhere is still reported, but later forms are
    /// neither analysed nor evaluated.
    pub fn load_unit(&self, text: &str, scope: &Scope) -> Result<Value, Error> {
        let forms = parse_with_config(text, &self.config)?;
        let Some(first) = forms.first() else {
            return Ok(Value::Unspecified);
        };
        let value = self.evaluate(&Expr::analyze(first)?, scope)?;
        debug!(forms = forms.len(), "loaded unit");
        Ok(value)
    }

    /// Evaluate an expression against `scope`
    pub fn evaluate(&self, expr: &Expr, scope: &Scope) -> Result<Value, Error> {
        self.eval_with_depth_tracking(expr, scope, 0)
    }

    /// Apply a callable value to already-evaluated arguments
    pub fn apply(&self, callee: &Value, args: Vec<Value>) -> Result<Value, Error> {
        self.apply_with_depth_tracking(callee, args, 0)
    }

    fn eval_with_depth_tracking(
        &self,
        expr: &Expr,
        scope: &Scope,
        depth: usize,
    ) -> Result<Value, Error> {
        let limit = self.config.max_eval_depth;
        if depth >= limit {
            return Err(Error::RecursionLimitExceeded { limit });
        }

        ensure_sufficient_stack(|| match expr {
            Expr::Literal(value) | Expr::Quote(value) => Ok(value.clone()),

            Expr::Symbol(name) => scope.lookup(name),

            Expr::If {
                test,
                then,
                otherwise,
            } => {
                if self.eval_with_depth_tracking(test, scope, depth + 1)?.is_truthy() {
                    self.eval_with_depth_tracking(then, scope, depth + 1)
                } else if let Some(otherwise) = otherwise {
                    self.eval_with_depth_tracking(otherwise, scope, depth + 1)
                } else {
                    Ok(Value::Unspecified)
                }
            }

            Expr::Set { name, value } => {
                let value = self.eval_with_depth_tracking(value, scope, depth + 1)?;
                // Assigning a name bound nowhere is silently ignored
                let assigned = scope.assign(name, value);
                trace!(name = %name, assigned, "set!");
                Ok(Value::Unspecified)
            }

            Expr::Define { name, value } => {
                let value = self.eval_with_depth_tracking(value, scope, depth + 1)?;
                trace!(name = %name, "define");
                scope.define(name.as_str(), value);
                Ok(Value::Unspecified)
            }

            Expr::Lambda { params, body } => Ok(Value::Closure(Rc::new(Closure {
                params: Rc::clone(params),
                body: Rc::clone(body),
                scope: scope.clone(),
            }))),

            Expr::Begin(exprs) => {
                let mut result = Value::Nil;
                for expr in exprs {
                    result = self.eval_with_depth_tracking(expr, scope, depth + 1)?;
                }
                Ok(result)
            }

            Expr::Import { bundle, body } => {
                let bindings = self
                    .bundles
                    .resolve(bundle)
                    .ok_or_else(|| Error::BundleNotFound(bundle.clone()))?;
                debug!(bundle = %bundle, bindings = bindings.len(), "loaded bundle");
                let import_scope = scope.child();
                for (name, value) in bindings {
                    import_scope.define(name, value);
                }
                self.eval_with_depth_tracking(body, &import_scope, depth + 1)
            }

            Expr::Apply { callee, args } => {
                let callee = self.eval_with_depth_tracking(callee, scope, depth + 1)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval_with_depth_tracking(arg, scope, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                self.apply_with_depth_tracking(&callee, args, depth + 1)
            }
        })
    }

    fn apply_with_depth_tracking(
        &self,
        callee: &Value,
        args: Vec<Value>,
        depth: usize,
    ) -> Result<Value, Error> {
        match callee {
            Value::Primitive(primitive) => primitive.call(args),

            Value::Closure(closure) => {
                let call_scope = closure.scope.child();
                let mut args = args.into_iter();
                // Missing arguments bind Unspecified, extra arguments are dropped
                for param in closure.params.iter() {
                    call_scope.define(param.as_str(), args.next().unwrap_or(Value::Unspecified));
                }
                trace!(params = closure.params.len(), "apply closure");
                self.eval_with_depth_tracking(&closure.body, &call_scope, depth + 1)
            }

            other => Err(Error::NotCallable(other.to_string())),
        }
    }
}
