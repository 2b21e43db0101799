#![forbid(unsafe_code)]

//! Runtime support for formgate.
//!
//! The only runtime concern today is the reactive layer in [`reactive`]:
//! push-based, single-threaded signals that the validation orchestrator in
//! `formgate-core` composes into its validity, dirty, busy, and apply-gate
//! state.

pub mod reactive;

pub use reactive::{Binding, BindingScope, ChangeNotifier, Observable, Subscription};
