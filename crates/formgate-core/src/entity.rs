#![forbid(unsafe_code)]

//! Editable entity contract.
//!
//! Anything the controller validates implements [`Validatable`] by embedding
//! an [`EntityState`]: the entity's declared field set, its [`ErrorStore`],
//! and its change stream. Setters go through [`EntityState::assign`] so an
//! edit that does not change the value raises nothing.
//!
//! Change events are tagged: [`PropertyChange::Field`] for content edits and
//! [`PropertyChange::Meta`] for controller bookkeeping (busy, dirty, commit
//! error, command handles). Only content edits mark a form dirty or trigger
//! validation.

use std::cell::RefCell;

use formgate_runtime::{ChangeNotifier, Subscription};

use crate::error_store::ErrorStore;

/// Controller bookkeeping properties published on the form's change stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaProperty {
    Busy,
    Dirty,
    CommitError,
    /// The apply command handle (created on first successful initialize).
    Apply,
    /// The reset command handle.
    Reset,
}

/// One "property changed" event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyChange {
    Field(&'static str),
    Meta(MetaProperty),
}

impl PropertyChange {
    /// Whether this is controller bookkeeping rather than an edit.
    #[must_use]
    pub const fn is_meta(&self) -> bool {
        matches!(self, Self::Meta(_))
    }

    /// The edited field, for content changes.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::Field(name) => Some(*name),
            Self::Meta(_) => None,
        }
    }
}

/// Validation and change-notification state embedded in every entity.
#[derive(Debug)]
pub struct EntityState {
    errors: ErrorStore,
    changes: ChangeNotifier<PropertyChange>,
}

impl EntityState {
    #[must_use]
    pub fn new(fields: &'static [&'static str]) -> Self {
        Self {
            errors: ErrorStore::new(fields),
            changes: ChangeNotifier::new(),
        }
    }

    #[must_use]
    pub fn fields(&self) -> &'static [&'static str] {
        self.errors.fields()
    }

    #[must_use]
    pub fn errors(&self) -> &ErrorStore {
        &self.errors
    }

    #[must_use]
    pub fn changes(&self) -> &ChangeNotifier<PropertyChange> {
        &self.changes
    }

    /// Listen to every property change of this entity.
    pub fn subscribe(&self, callback: impl Fn(&PropertyChange) + 'static) -> Subscription {
        self.changes.subscribe(callback)
    }

    /// Announce an edit to `field`.
    pub fn field_changed(&self, field: &'static str) {
        debug_assert!(
            self.fields().contains(&field),
            "'{field}' is not a declared field"
        );
        self.changes.emit(&PropertyChange::Field(field));
    }

    /// Announce a bookkeeping change.
    pub fn emit_meta(&self, meta: MetaProperty) {
        self.changes.emit(&PropertyChange::Meta(meta));
    }

    /// Store `value` into `slot` and announce `field` if it changed.
    ///
    /// Returns whether the value changed. The slot borrow is released before
    /// subscribers run.
    pub fn assign<V: PartialEq>(&self, slot: &RefCell<V>, value: V, field: &'static str) -> bool {
        {
            let mut current = slot.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.field_changed(field);
        true
    }
}

/// An entity that can take part in validation.
pub trait Validatable: 'static {
    fn entity(&self) -> &EntityState;
}
