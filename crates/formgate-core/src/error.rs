#![forbid(unsafe_code)]

//! Error taxonomy for the form orchestrator.
//!
//! | Error | Cause | Handling |
//! |-------|-------|----------|
//! | [`UsageError`] | Illegal API sequencing or arguments | Returned to the caller, never retried |
//! | [`FormError::Initialization`] | Initialization delegate failed | Returned from `initialize()`/`reset()`; caller retries |
//! | Commit failure | Commit delegate failed | Absorbed into `commit_error`, form stays dirty |
//! | Evaluation failure | Rule evaluator failed | Absorbed into one synthetic message on the field |

use thiserror::Error;

/// Failure reported by a form's initialization or commit delegate.
pub type DelegateError = Box<dyn std::error::Error>;

/// Failure reported by a rule evaluator.
pub type EvaluationError = Box<dyn std::error::Error>;

/// Illegal sequencing or argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("form controller has been disposed")]
    Disposed,
    #[error("an initialize or reset is already in progress")]
    InitializeInProgress,
    #[error("a commit is already in progress")]
    CommitInProgress,
    #[error("form controller has not been initialized")]
    NotInitialized,
    #[error("apply is not available: the form must be valid, dirty, and idle")]
    ApplyUnavailable,
    #[error("'{field}' is not a field of this entity")]
    UnknownField { field: String },
    #[error("error list for '{property}' is empty; clear the property instead")]
    EmptyErrorSet { property: String },
}

/// Errors returned by [`FormController`](crate::FormController) operations.
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("form initialization failed: {0}")]
    Initialization(#[source] DelegateError),
}

impl FormError {
    /// The usage error, if this is one.
    #[must_use]
    pub fn usage(&self) -> Option<&UsageError> {
        match self {
            Self::Usage(err) => Some(err),
            Self::Initialization(_) => None,
        }
    }
}
