//! Lexical scope chain.
//!
//! A [`Scope`] is a shared handle to one frame of bindings plus an optional link to
//! its parent. Child frames are created for every closure call and bundle import;
//! closures keep their defining frame alive by holding a handle to it. Chains are
//! built only by [`Scope::child`], so they are finite and acyclic and every lookup
//! terminates at the root.
//!
//! Bindings can still point back up the chain. A closure stored in the frame it
//! captures, as a `define` of a lambda inside a function body does, forms an `Rc`
//! cycle, and that frame is never freed. Each call that runs such a `define`
//! leaks one frame, so a long session that calls it repeatedly grows without
//! bound. Frames no closure captures are freed when the call returns.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::Error;
use crate::ast::Value;

#[derive(Default)]
struct Frame {
    bindings: HashMap<String, Value>,
    parent: Option<Scope>,
}

#[derive(Clone, Default)]
pub struct Scope(Rc<RefCell<Frame>>);

impl Scope {
    /// A root scope with no parent
    pub fn new() -> Self {
        Scope::default()
    }

    /// A root scope pre-populated with `bindings`
    pub fn with_bindings(bindings: impl IntoIterator<Item = (String, Value)>) -> Self {
        let scope = Scope::new();
        for (name, value) in bindings {
            scope.define(name, value);
        }
        scope
    }

    /// A new empty frame whose parent is `self`
    pub fn child(&self) -> Self {
        Scope(Rc::new(RefCell::new(Frame {
            bindings: HashMap::new(),
            parent: Some(self.clone()),
        })))
    }

    pub fn parent(&self) -> Option<Scope> {
        self.0.borrow().parent.clone()
    }

    /// True if `name` is bound in this frame or any ancestor
    pub fn contains(&self, name: &str) -> bool {
        self.find(|frame| frame.bindings.contains_key(name).then_some(()))
            .is_some()
    }

    /// The value bound to `name` in the nearest frame
    pub fn lookup(&self, name: &str) -> Result<Value, Error> {
        self.find(|frame| frame.bindings.get(name).cloned())
            .ok_or_else(|| Error::NameNotFound(name.to_owned()))
    }

    /// Bind `name` in this frame only, shadowing outer bindings and replacing
    /// an existing local one
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().bindings.insert(name.into(), value);
    }

    /// Overwrite `name` in the nearest frame that already binds it.
    ///
    /// Returns false, and changes nothing, when no frame binds `name`.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut cur = Some(self.clone());
        while let Some(scope) = cur {
            let mut frame = scope.0.borrow_mut();
            if let Some(slot) = frame.bindings.get_mut(name) {
                *slot = value;
                return true;
            }
            cur = frame.parent.clone();
        }
        false
    }

    /// Bindings of this frame alone, sorted by name
    pub fn local_bindings(&self) -> Vec<(String, Value)> {
        let mut result: Vec<_> = self
            .0
            .borrow()
            .bindings
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }

    /// Get all bindings visible from this scope, innermost winning.
    /// Returns a Vec of (name, value) pairs sorted by name
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings = HashMap::new();

        // Start with parent bindings so local ones override them
        if let Some(parent) = self.parent() {
            for (name, value) in parent.get_all_bindings() {
                bindings.insert(name, value);
            }
        }

        for (name, value) in &self.0.borrow().bindings {
            bindings.insert(name.clone(), value.clone());
        }

        let mut result: Vec<_> = bindings.into_iter().collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }

    fn find<T>(&self, probe: impl Fn(&Frame) -> Option<T>) -> Option<T> {
        let mut cur = Some(self.clone());
        while let Some(scope) = cur {
            let frame = scope.0.borrow();
            if let Some(found) = probe(&frame) {
                return Some(found);
            }
            cur = frame.parent.clone();
        }
        None
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let frame = self.0.borrow();
        let mut names: Vec<_> = frame.bindings.keys().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("bindings", &names)
            .field("has_parent", &frame.parent.is_some())
            .finish()
    }
}
