//! Per-validator outcome.

use serde::Serialize;

use super::value::ConfigValue;

/// Outcome of one validator applied to one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the check passed
    pub is_valid: bool,

    /// Configured failure message (empty on success)
    pub message: String,

    /// Validator type name
    pub validator_type: String,

    /// Flattened settings key that was checked
    pub key: String,

    /// Value the validator saw
    pub actual_value: ConfigValue,

    /// Underlying error text when the check could not be evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    /// A passing result.
    #[must_use]
    pub fn success(key: &str, validator_type: &str, actual_value: ConfigValue) -> Self {
        Self {
            is_valid: true,
            message: String::new(),
            validator_type: validator_type.to_string(),
            key: key.to_string(),
            actual_value,
            error: None,
        }
    }

    /// A failing result carrying the configured message.
    #[must_use]
    pub fn failure(
        key: &str,
        validator_type: &str,
        actual_value: ConfigValue,
        message: &str,
    ) -> Self {
        Self {
            is_valid: false,
            message: message.to_string(),
            validator_type: validator_type.to_string(),
            key: key.to_string(),
            actual_value,
            error: None,
        }
    }

    /// Builds a pass or fail result from a boolean outcome.
    #[must_use]
    pub fn from_outcome(
        passed: bool,
        key: &str,
        validator_type: &str,
        actual_value: ConfigValue,
        message: &str,
    ) -> Self {
        if passed {
            Self::success(key, validator_type, actual_value)
        } else {
            Self::failure(key, validator_type, actual_value, message)
        }
    }

    /// Attaches the underlying error text.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
