//! Applies rules to one flattened settings file.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::flatten::FlattenedSettings;
use crate::config::schema::{Condition, Rule};
use crate::engine::result::{FileValidationResult, RULE_STRUCTURE};
use crate::error::{Result, SGuardError};
use crate::validators::{ConfigValue, ValidationResult, ValidatorRegistry};

/// Runs every condition of every rule against a settings map.
#[derive(Debug, Clone, Default)]
pub struct FileValidator {
    registry: Arc<ValidatorRegistry>,
}

impl FileValidator {
    /// Creates a file validator using `registry` to resolve validator types.
    #[must_use]
    pub const fn new(registry: Arc<ValidatorRegistry>) -> Self {
        Self { registry }
    }

    /// Validates `settings` against `rules`.
    ///
    /// Malformed rules and conditions, unknown validator types and bad
    /// operands become failing entries; the remaining checks still run.
    ///
    /// # Errors
    ///
    /// Returns [`SGuardError::InvalidArgument`] when `file_id` is empty, and
    /// propagates validator errors other than unknown types and bad operands.
    pub fn validate_file(
        &self,
        file_id: &str,
        rules: &[Rule],
        settings: &FlattenedSettings,
    ) -> Result<FileValidationResult> {
        if file_id.trim().is_empty() {
            return Err(SGuardError::invalid_argument(
                "file_id",
                "file identifier must not be empty",
            ));
        }

        let mut file = FileValidationResult::new(file_id);
        for rule in rules {
            let Some(detail) = rule.detail.as_ref().filter(|d| !d.id.trim().is_empty()) else {
                file.results.push(ValidationResult::failure(
                    "",
                    RULE_STRUCTURE,
                    ConfigValue::Null,
                    &format!("Rule '{}' has no valid rule detail", rule.id),
                ));
                continue;
            };

            for condition in &detail.conditions {
                self.apply_condition(&detail.id, condition, settings, &mut file.results)?;
            }
        }

        debug!(
            file_id,
            checks = file.results.len(),
            failed = file.failures().count(),
            "validated settings file"
        );
        Ok(file)
    }

    fn apply_condition(
        &self,
        rule_id: &str,
        condition: &Condition,
        settings: &FlattenedSettings,
        results: &mut Vec<ValidationResult>,
    ) -> Result<()> {
        if condition.key.trim().is_empty() || condition.validators.is_empty() {
            results.push(ValidationResult::failure(
                &condition.key,
                RULE_STRUCTURE,
                ConfigValue::Null,
                &format!("Rule '{rule_id}' has a condition without a key or validators"),
            ));
            return Ok(());
        }

        let value = settings.get(&condition.key).cloned().unwrap_or(ConfigValue::Null);
        for validator_condition in &condition.validators {
            let outcome = self
                .registry
                .get(&validator_condition.validator_type)
                .and_then(|validator| validator.validate(&condition.key, &value, validator_condition));

            let result = match outcome {
                Ok(result) => result,
                Err(err @ (SGuardError::UnsupportedValidator { .. } | SGuardError::InvalidArgument { .. })) => {
                    trace!(key = %condition.key, error = %err, "validator could not be evaluated");
                    ValidationResult::failure(
                        &condition.key,
                        &validator_condition.validator_type,
                        value.clone(),
                        &validator_condition.message,
                    )
                    .with_error(err.to_string())
                }
                Err(err) => return Err(err),
            };
            results.push(result);
        }
        Ok(())
    }
}
