#![forbid(unsafe_code)]

//! Read bindings and subscription scopes.
//!
//! A [`Binding<T>`] is a lazily evaluated read over one or more
//! [`Observable`]s, suitable for status lines and labels. A [`BindingScope`]
//! owns a group of [`Subscription`]s so that a whole reactive graph (one
//! registration, one validity fold, one gate) can be torn down in a single
//! call.
//!
//! # Usage
//!
//! ```
//! use formgate_runtime::reactive::{Binding, BindingScope, Observable};
//!
//! let valid = Observable::new(false);
//! let dirty = Observable::new(false);
//! let (v, d) = (valid.clone(), dirty.clone());
//! let label = Binding::new(move || format!("valid={} dirty={}", v.get(), d.get()));
//! assert_eq!(label.get(), "valid=false dirty=false");
//!
//! let mut scope = BindingScope::new();
//! scope.subscribe(&dirty, |d| assert!(*d));
//! dirty.set(true);
//! assert_eq!(label.get(), "valid=false dirty=true");
//!
//! scope.clear();
//! assert!(scope.is_empty());
//! ```
//!
//! # Invariants
//!
//! 1. `Binding::get()` always evaluates against current values (no caching).
//! 2. After `BindingScope::clear()` or drop, no callback held by the scope
//!    fires again.
//! 3. A cleared scope is reusable.

use std::fmt;
use std::rc::Rc;

use super::observable::{Observable, Subscription};

/// A read-only, lazily evaluated binding.
pub struct Binding<T> {
    eval: Rc<dyn Fn() -> T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            eval: Rc::clone(&self.eval),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("value", &self.get())
            .finish()
    }
}

impl<T: 'static> Binding<T> {
    /// Create a binding that evaluates `f` on each `get()` call.
    pub fn new(f: impl Fn() -> T + 'static) -> Self {
        Self { eval: Rc::new(f) }
    }

    #[must_use]
    pub fn get(&self) -> T {
        (self.eval)()
    }
}

/// Owns subscriptions for one logical reactive graph.
///
/// Subscriptions are released in registration order on `clear()` and on drop.
#[derive(Default)]
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
}

impl BindingScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an existing subscription.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Subscribe to future changes of `source` within this scope.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        let sub = source.subscribe(callback);
        self.subscriptions.push(sub);
        self
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release everything now; the scope stays usable.
    pub fn clear(&mut self) {
        if !self.subscriptions.is_empty() {
            tracing::trace!(released = self.subscriptions.len(), "binding scope cleared");
        }
        // Move out first so callbacks reached from a destructor never observe
        // a half-drained scope.
        let released = std::mem::take(&mut self.subscriptions);
        drop(released);
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingScope")
            .field("binding_count", &self.subscriptions.len())
            .finish()
    }
}
