#![forbid(unsafe_code)]

//! Controller policy.
//!
//! [`ControllerConfig`] selects how overlapping field evaluations are ordered
//! and which messages the controller synthesizes. With the `policy-config`
//! feature the config can be loaded from TOML or JSON:
//!
//! ```toml
//! evaluation_order = "latest-edit"
//! failure_prefix = "Check failed: "
//! rejected_commit_message = "Save was refused"
//! ```
//!
//! Missing keys take their defaults.

#[cfg(feature = "policy-config")]
use std::path::Path;

/// What happens when a field is edited again before its previous evaluation
/// finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum EvaluationOrder {
    /// Both evaluations run; whichever result arrives last is stored.
    #[default]
    Arrival,
    /// The newer edit aborts the older evaluation; the latest edit's result
    /// is stored.
    LatestEdit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ControllerConfig {
    pub evaluation_order: EvaluationOrder,
    /// Prepended to an evaluator error to form the field's single message.
    pub failure_prefix: String,
    /// Commit error shown when the commit delegate reports `false`.
    pub rejected_commit_message: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            evaluation_order: EvaluationOrder::Arrival,
            failure_prefix: "Validation failed: ".to_string(),
            rejected_commit_message: "Commit was rejected".to_string(),
        }
    }
}

impl ControllerConfig {
    #[must_use]
    pub fn with_evaluation_order(mut self, order: EvaluationOrder) -> Self {
        self.evaluation_order = order;
        self
    }

    #[must_use]
    pub fn with_failure_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.failure_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_rejected_commit_message(mut self, message: impl Into<String>) -> Self {
        self.rejected_commit_message = message.into();
        self
    }
}

/// Errors from loading a [`ControllerConfig`].
#[cfg(feature = "policy-config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(feature = "policy-config")]
impl ControllerConfig {
    /// Parse TOML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Toml`] on malformed input or unknown enum values.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Parse JSON.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] on malformed input or unknown enum values.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load from a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// I/O and parse errors, or [`ConfigError::UnsupportedFormat`] for any
    /// other extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&raw),
            Some("json") => Self::from_json_str(&raw),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = ControllerConfig::default();
        assert_eq!(config.evaluation_order, EvaluationOrder::Arrival);
        assert_eq!(config.failure_prefix, "Validation failed: ");
        assert_eq!(config.rejected_commit_message, "Commit was rejected");
    }

    #[test]
    fn builders_override_fields() {
        let config = ControllerConfig::default()
            .with_evaluation_order(EvaluationOrder::LatestEdit)
            .with_failure_prefix("oops: ")
            .with_rejected_commit_message("no");
        assert_eq!(config.evaluation_order, EvaluationOrder::LatestEdit);
        assert_eq!(config.failure_prefix, "oops: ");
        assert_eq!(config.rejected_commit_message, "no");
    }

    #[cfg(feature = "policy-config")]
    mod policy_config {
        use super::*;
        use std::io::Write;

        #[test]
        fn toml_partial_uses_defaults() {
            let config = ControllerConfig::from_toml_str("evaluation_order = \"latest-edit\"\n").unwrap();
            assert_eq!(config.evaluation_order, EvaluationOrder::LatestEdit);
            assert_eq!(config.failure_prefix, "Validation failed: ");
        }

        #[test]
        fn json_round_trip() {
            let config = ControllerConfig::default().with_failure_prefix("x: ");
            let json = serde_json::to_string(&config).unwrap();
            assert_eq!(ControllerConfig::from_json_str(&json).unwrap(), config);
        }

        #[test]
        fn unknown_order_is_rejected() {
            let err = ControllerConfig::from_toml_str("evaluation_order = \"sometimes\"").unwrap_err();
            assert!(matches!(err, ConfigError::Toml(_)));
        }

        #[test]
        fn load_dispatches_on_extension() {
            let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
            writeln!(file, "rejected_commit_message = \"Save was refused\"").unwrap();
            let config = ControllerConfig::load(file.path()).unwrap();
            assert_eq!(config.rejected_commit_message, "Save was refused");

            let other = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
            assert!(matches!(
                ControllerConfig::load(other.path()),
                Err(ConfigError::UnsupportedFormat(_))
            ));
        }
    }
}
