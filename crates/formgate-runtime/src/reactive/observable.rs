#![forbid(unsafe_code)]

//! Shared latest-value cell with change notification.
//!
//! An [`Observable<T>`] is a cheaply clonable handle: every clone reads and
//! writes the same value and shares the same subscriber list. Subscribers are
//! held weakly; the returned [`Subscription`] owns the callback.
//!
//! # Failure Modes
//!
//! - Callback panic: propagates to the caller of `set()`. Subscribers after
//!   the panicking one are not notified for that cycle.
//! - Nested mutation from inside a callback: the nested cycle delivers the
//!   newer value to every subscriber, and the outer (stale) cycle stops.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub(crate) type Callback<T> = dyn Fn(&T);

/// Ordered list of weakly held callbacks.
pub(crate) struct SubscriberList<T: 'static> {
    entries: Vec<Weak<Callback<T>>>,
}

impl<T: 'static> SubscriberList<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Callback<T>> = Rc::new(callback);
        self.entries.push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Prune dead entries and return the live ones in registration order.
    ///
    /// Entries stay weak so a subscription dropped mid-cycle is skipped.
    pub(crate) fn snapshot(&mut self) -> Vec<Weak<Callback<T>>> {
        self.entries.retain(|entry| entry.strong_count() > 0);
        self.entries.clone()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }
}

/// RAII guard for a registered callback.
///
/// The callback stays registered for as long as this guard is alive.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl Subscription {
    fn new<T: 'static>(callback: Rc<Callback<T>>) -> Self {
        Self {
            _callback: Box::new(callback),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

struct ObservableInner<T: 'static> {
    value: T,
    version: u64,
    subscribers: SubscriberList<T>,
}

/// A shared, version-tracked value that notifies subscribers on change.
pub struct Observable<T: 'static> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: SubscriberList::new(),
            })),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value for the duration of `f`.
    ///
    /// `f` must not mutate this observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying subscribers if it changed.
    pub fn set(&self, value: T) {
        let version = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
            inner.version
        };
        self.notify(version);
    }

    /// Modify the value in place through a copy; notifies only on change.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Number of changes applied since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Register `callback` for future changes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.borrow_mut().subscribers.add(callback)
    }

    /// Deliver the current value to `callback` now, then subscribe it.
    pub fn watch(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let current = self.get();
        callback(&current);
        self.subscribe(callback)
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.live_count()
    }

    fn notify(&self, version: u64) {
        let (value, subscribers) = {
            let mut inner = self.inner.borrow_mut();
            (inner.value.clone(), inner.subscribers.snapshot())
        };
        for entry in subscribers {
            if self.inner.borrow().version != version {
                // A callback changed the value again; that cycle has already
                // delivered the newer value to everyone.
                return;
            }
            if let Some(callback) = entry.upgrade() {
                callback(&value);
            }
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}
