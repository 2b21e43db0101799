#![forbid(unsafe_code)]

//! Reactive signals for form state.
//!
//! This module provides the change-propagation primitives the form
//! controller is built on:
//!
//! - [`Observable`]: A shared, version-tracked latest value with change
//!   notification via subscriber callbacks.
//! - [`ChangeNotifier`]: A broadcast stream of events with no stored value
//!   (e.g. "property `name` changed").
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`BindingScope`]: Owns a group of subscriptions so they can be torn down
//!   together.
//! - [`Binding`]: A lazily evaluated read of one or more observables.
//!
//! # Architecture
//!
//! Both `Observable<T>` and `ChangeNotifier<E>` use `Rc<RefCell<..>>` for
//! single-threaded shared ownership. Subscribers are stored as `Weak`
//! function pointers; the strong side lives in the returned
//! [`Subscription`]. Dead entries are pruned lazily during notification.
//!
//! Everything here is `!Send`. All emission happens on the thread (event
//! queue) that owns the values.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. A [`Subscription`] dropped during a notification cycle is not called
//!    for the remainder of that cycle.
//! 5. Callbacks run with no internal borrow held, so they may read or write
//!    the observable that notified them.

pub mod binding;
pub mod notifier;
pub mod observable;

pub use binding::{Binding, BindingScope};
pub use notifier::ChangeNotifier;
pub use observable::{Observable, Subscription};
