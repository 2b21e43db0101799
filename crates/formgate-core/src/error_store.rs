#![forbid(unsafe_code)]

//! Per-entity validation error bookkeeping.
//!
//! An [`ErrorStore`] maps each field of one entity to the messages currently
//! reported against it. Keys are checked against the entity's declared field
//! set, so a misspelt property name fails loudly instead of silently storing
//! errors nobody will ever read.
//!
//! # Invariants
//!
//! 1. A field is present iff it has at least one message.
//! 2. Every mutation that changes membership or messages emits exactly one
//!    change notification carrying the affected field.
//! 3. `has_errors()` is true iff the store is non-empty.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

use formgate_runtime::{ChangeNotifier, Subscription};

use crate::error::UsageError;

/// Validation messages keyed by field name.
pub struct ErrorStore {
    fields: &'static [&'static str],
    entries: RefCell<BTreeMap<&'static str, Vec<String>>>,
    changed: ChangeNotifier<&'static str>,
}

impl ErrorStore {
    /// Create an empty store accepting only `fields` as keys.
    #[must_use]
    pub fn new(fields: &'static [&'static str]) -> Self {
        Self {
            fields,
            entries: RefCell::new(BTreeMap::new()),
            changed: ChangeNotifier::new(),
        }
    }

    /// The field set this store accepts.
    #[must_use]
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    /// Map a property name onto the declared field set.
    ///
    /// # Errors
    ///
    /// [`UsageError::UnknownField`] if `property` is not a declared field.
    pub fn resolve(&self, property: &str) -> Result<&'static str, UsageError> {
        self.fields
            .iter()
            .copied()
            .find(|field| *field == property)
            .ok_or_else(|| UsageError::UnknownField {
                field: property.to_string(),
            })
    }

    /// Replace the messages for `property`.
    ///
    /// # Errors
    ///
    /// - [`UsageError::EmptyErrorSet`] if `messages` is empty; use
    ///   [`clear_errors`](Self::clear_errors) instead.
    /// - [`UsageError::UnknownField`] if `property` is not a declared field.
    pub fn set_errors(&self, property: &str, messages: Vec<String>) -> Result<(), UsageError> {
        if messages.is_empty() {
            return Err(UsageError::EmptyErrorSet {
                property: property.to_string(),
            });
        }
        let field = self.resolve(property)?;
        self.entries.borrow_mut().insert(field, messages);
        self.changed.emit(&field);
        Ok(())
    }

    /// Remove every message for `property`. No-op if it has none.
    ///
    /// # Errors
    ///
    /// [`UsageError::UnknownField`] if `property` is not a declared field.
    pub fn clear_errors(&self, property: &str) -> Result<(), UsageError> {
        let field = self.resolve(property)?;
        let removed = self.entries.borrow_mut().remove(field).is_some();
        if removed {
            self.changed.emit(&field);
        }
        Ok(())
    }

    /// Remove everything, notifying once per field that had errors.
    pub fn clear_all(&self) {
        let removed = std::mem::take(&mut *self.entries.borrow_mut());
        for field in removed.into_keys() {
            self.changed.emit(&field);
        }
    }

    /// Messages currently stored for `property`.
    #[must_use]
    pub fn errors(&self, property: &str) -> Option<Vec<String>> {
        self.entries.borrow().get(property).cloned()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.entries.borrow().is_empty()
    }

    /// Fields currently in error, sorted.
    #[must_use]
    pub fn properties(&self) -> Vec<&'static str> {
        self.entries.borrow().keys().copied().collect()
    }

    /// Listen for changes; the callback receives the affected field.
    pub fn subscribe(&self, callback: impl Fn(&&'static str) + 'static) -> Subscription {
        self.changed.subscribe(callback)
    }
}

impl fmt::Debug for ErrorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorStore")
            .field("fields", &self.fields)
            .field("entries", &*self.entries.borrow())
            .finish()
    }
}
