//! Validation outcomes returned by the engine.

use serde::Serialize;

use crate::validators::{ConfigValue, ValidationResult};

/// Validator type recorded on synthetic entries for structural rule problems.
pub const RULE_STRUCTURE: &str = "rule_structure";

/// Validator type recorded on synthetic entries for environments that could
/// not be processed.
pub const ENVIRONMENT_ERROR: &str = "environment_error";

/// Every validation result for one settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileValidationResult {
    /// Settings file identifier
    pub file_id: String,

    /// Environment the file belongs to, when run through the engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// One entry per validator per condition, in rule order
    pub results: Vec<ValidationResult>,
}

impl FileValidationResult {
    /// Creates an empty result for `file_id`.
    #[must_use]
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            environment: None,
            results: Vec::new(),
        }
    }

    /// Failing result standing in for an environment that raised an error.
    #[must_use]
    pub fn environment_failure(environment: &str, error: &str) -> Self {
        Self {
            file_id: environment.to_string(),
            environment: Some(environment.to_string()),
            results: vec![
                ValidationResult::failure(
                    "",
                    ENVIRONMENT_ERROR,
                    ConfigValue::Null,
                    &format!("Failed to validate environment '{environment}'"),
                )
                .with_error(error),
            ],
        }
    }

    /// `true` when every entry passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|r| r.is_valid)
    }

    /// Entries that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.is_valid)
    }
}

/// Single-environment or batch outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "files")]
pub enum ValidationOutcome {
    /// One environment was validated
    Single(FileValidationResult),
    /// Every environment was validated, in declaration order
    Batch(Vec<FileValidationResult>),
}

impl ValidationOutcome {
    /// File results regardless of shape.
    #[must_use]
    pub fn files(&self) -> &[FileValidationResult] {
        match self {
            Self::Single(file) => std::slice::from_ref(file),
            Self::Batch(files) => files,
        }
    }
}

/// Result of a [`RuleEngine`](crate::engine::RuleEngine) run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEngineResult {
    /// `true` when every validation in every file passed
    pub success: bool,

    /// Summary of environments that could not be processed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Per-file results
    pub outcome: ValidationOutcome,
}

impl RuleEngineResult {
    /// Wraps a single-environment result.
    #[must_use]
    pub fn single(file: FileValidationResult) -> Self {
        Self {
            success: file.is_valid(),
            error_message: None,
            outcome: ValidationOutcome::Single(file),
        }
    }

    /// Wraps a batch result. `errors` are the messages of environments that
    /// were replaced by synthetic failures.
    #[must_use]
    pub fn batch(files: Vec<FileValidationResult>, errors: &[String]) -> Self {
        let error_message = (!errors.is_empty()).then(|| {
            format!(
                "{} environment(s) could not be validated: {}",
                errors.len(),
                errors.join("; ")
            )
        });
        Self {
            success: errors.is_empty() && files.iter().all(FileValidationResult::is_valid),
            error_message,
            outcome: ValidationOutcome::Batch(files),
        }
    }

    /// File results regardless of shape.
    #[must_use]
    pub fn files(&self) -> &[FileValidationResult] {
        self.outcome.files()
    }

    /// Total number of failed entries.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.files().iter().map(|f| f.failures().count()).sum()
    }
}
