#![forbid(unsafe_code)]

//! Rule-evaluation collaborator contract.
//!
//! The controller does not know how rules are written. It only asks a
//! [`RuleEvaluator`] to check a target, either as a whole (`property ==
//! None`) or for a single edited field, and writes the resulting
//! [`ValidationReport`] into the target's error store.

use futures::future::LocalBoxFuture;

use crate::error::EvaluationError;

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    pub property: String,
    pub message: String,
}

/// Outcome of one evaluation, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    failures: Vec<RuleFailure>,
}

impl ValidationReport {
    /// A report with no failures.
    #[must_use]
    pub fn valid() -> Self {
        Self::default()
    }

    /// Record a failure.
    pub fn push(&mut self, property: impl Into<String>, message: impl Into<String>) {
        self.failures.push(RuleFailure {
            property: property.into(),
            message: message.into(),
        });
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with_failure(mut self, property: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(property, message);
        self
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn failures(&self) -> &[RuleFailure] {
        &self.failures
    }

    /// Messages reported against `property`, in rule order.
    #[must_use]
    pub fn messages_for(&self, property: &str) -> Vec<String> {
        self.failures
            .iter()
            .filter(|failure| failure.property == property)
            .map(|failure| failure.message.clone())
            .collect()
    }
}

impl FromIterator<RuleFailure> for ValidationReport {
    fn from_iter<I: IntoIterator<Item = RuleFailure>>(iter: I) -> Self {
        Self {
            failures: iter.into_iter().collect(),
        }
    }
}

/// Asynchronous rule evaluation for targets of type `T`.
pub trait RuleEvaluator<T: ?Sized> {
    /// Every property these rules can report on.
    ///
    /// Checked against the target's field set at registration time.
    fn properties(&self) -> &[&'static str];

    /// Evaluate all rules (`property == None`) or only those for `property`.
    ///
    /// Expected rule violations belong in the report; `Err` is reserved for
    /// the evaluator itself breaking.
    fn evaluate<'a>(
        &'a self,
        target: &'a T,
        property: Option<&'a str>,
    ) -> LocalBoxFuture<'a, Result<ValidationReport, EvaluationError>>;
}
