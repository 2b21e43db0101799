#![forbid(unsafe_code)]

//! Valueless event broadcast.
//!
//! [`ChangeNotifier<E>`] is the "property P changed" source: unlike
//! [`Observable`](super::Observable) it stores nothing and never
//! deduplicates, so every `emit` reaches every live subscriber.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::observable::{SubscriberList, Subscription};

/// Broadcasts events of type `E` to subscribers in registration order.
pub struct ChangeNotifier<E: 'static> {
    subscribers: Rc<RefCell<SubscriberList<E>>>,
    emitted: Rc<Cell<u64>>,
}

impl<E: 'static> Clone for ChangeNotifier<E> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
            emitted: Rc::clone(&self.emitted),
        }
    }
}

impl<E: 'static> ChangeNotifier<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(SubscriberList::new())),
            emitted: Rc::new(Cell::new(0)),
        }
    }

    /// Deliver `event` to every live subscriber.
    pub fn emit(&self, event: &E) {
        self.emitted.set(self.emitted.get() + 1);
        let subscribers = self.subscribers.borrow_mut().snapshot();
        for entry in subscribers {
            if let Some(callback) = entry.upgrade() {
                callback(event);
            }
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        self.subscribers.borrow_mut().add(callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().live_count()
    }

    /// Total events emitted, including those nobody was listening to.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted.get()
    }
}

impl<E: 'static> Default for ChangeNotifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> fmt::Debug for ChangeNotifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .field("emitted", &self.emitted.get())
            .finish()
    }
}
