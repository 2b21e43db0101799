#![forbid(unsafe_code)]

//! Validation aggregation and the dirty/busy/commit lifecycle for editable
//! forms.
//!
//! # Role in formgate
//! `formgate-core` decides, at any moment, whether a form is valid, dirty,
//! and busy, and therefore whether it may be committed. It sits on the
//! reactive signals of `formgate-runtime` and leaves rule authoring,
//! persistence, and widgets to its callers.
//!
//! # Primary responsibilities
//! - **ErrorStore**: per-property error messages with change notification.
//! - **ValidationAggregator**: AND of a dynamic participant set.
//! - **FormController**: initialize/commit/apply/reset lifecycle, dirty
//!   tracking, and the apply gate.
//!
//! # How it fits in the system
//! A concrete form implements [`FormDelegate`] and registers the entities it
//! edits with a [`RuleEvaluator`] each. Edits flow through the entity's
//! change stream into evaluations spawned on the controller's event queue;
//! results land in each entity's [`ErrorStore`], which drives participant
//! validity, the aggregate, and finally [`FormController::can_apply`].

pub mod aggregator;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod error_store;
pub mod evaluator;
pub mod gate;
pub mod participant;

pub use aggregator::ValidationAggregator;
#[cfg(feature = "policy-config")]
pub use config::ConfigError;
pub use config::{ControllerConfig, EvaluationOrder};
pub use controller::{
    CommitOutcome, FormController, FormDelegate, LifecycleState, Registrar, Registration,
};
pub use entity::{EntityState, MetaProperty, PropertyChange, Validatable};
pub use error::{DelegateError, EvaluationError, FormError, UsageError};
pub use error_store::ErrorStore;
pub use evaluator::{RuleEvaluator, RuleFailure, ValidationReport};
pub use gate::{ApplyGate, BusyGuard, apply_gate};
pub use participant::{Participant, ParticipantId, ParticipantKind, ParticipantValidity};

pub use formgate_runtime::{Observable, Subscription};
