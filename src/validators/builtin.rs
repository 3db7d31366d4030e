//! Built-in validators.

use std::cmp::Ordering;

use crate::config::schema::ValidatorCondition;
use crate::error::{Result, SGuardError};

use super::compare::{compare_values, values_equal};
use super::result::ValidationResult;
use super::value::{ConfigValue, ValueKind};
use super::Validator;

const TEXTUAL: &[ValueKind] = &[
    ValueKind::Null,
    ValueKind::String,
    ValueKind::Number,
    ValueKind::Bool,
    ValueKind::Raw,
];

const ORDERED: &[ValueKind] = &[ValueKind::Number, ValueKind::String, ValueKind::Bool];

/// Returns the condition operand, failing when it is missing.
fn operand(condition: &ValidatorCondition) -> Result<ConfigValue> {
    condition
        .value
        .as_ref()
        .map(ConfigValue::from_json)
        .filter(|value| !value.is_null())
        .ok_or_else(|| {
            SGuardError::invalid_argument(
                "condition.value",
                format!("validator '{}' requires a value", condition.validator_type),
            )
        })
}

// ============================================================================
// Presence
// ============================================================================

/// Fails only when the value is null or the key is absent.
#[derive(Debug, Default)]
pub struct RequiredValidator;

impl Validator for RequiredValidator {
    fn name(&self) -> &'static str {
        "required"
    }

    fn supported_kinds(&self) -> &'static [ValueKind] {
        ValueKind::ALL
    }

    fn validate(
        &self,
        key: &str,
        value: &ConfigValue,
        condition: &ValidatorCondition,
    ) -> Result<ValidationResult> {
        Ok(ValidationResult::from_outcome(
            !value.is_null(),
            key,
            self.name(),
            value.clone(),
            &condition.message,
        ))
    }
}

// ============================================================================
// Length
// ============================================================================

/// Which bound a [`LengthValidator`] enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthBound {
    /// `min_len`
    Min,
    /// `max_len`
    Max,
}

/// `min_len` / `max_len`.
#[derive(Debug)]
pub struct LengthValidator {
    bound: LengthBound,
}

impl LengthValidator {
    /// Creates a length validator for the given bound.
    #[must_use]
    pub const fn new(bound: LengthBound) -> Self {
        Self { bound }
    }
}

impl Validator for LengthValidator {
    fn name(&self) -> &'static str {
        match self.bound {
            LengthBound::Min => "min_len",
            LengthBound::Max => "max_len",
        }
    }

    fn supported_kinds(&self) -> &'static [ValueKind] {
        TEXTUAL
    }

    fn validate(
        &self,
        key: &str,
        value: &ConfigValue,
        condition: &ValidatorCondition,
    ) -> Result<ValidationResult> {
        let limit = operand(condition)?.to_i32().ok_or_else(|| {
            SGuardError::invalid_argument(
                "condition.value",
                format!("validator '{}' requires an integer value", self.name()),
            )
        })?;
        let limit = usize::try_from(limit).map_err(|_| {
            SGuardError::invalid_argument(
                "condition.value",
                format!("validator '{}' requires a non-negative value", self.name()),
            )
        })?;

        let length = value.length();
        let passed = match self.bound {
            LengthBound::Min => length >= limit,
            LengthBound::Max => length <= limit,
        };
        Ok(ValidationResult::from_outcome(
            passed,
            key,
            self.name(),
            value.clone(),
            &condition.message,
        ))
    }
}

// ============================================================================
// Equality
// ============================================================================

/// `eq` / `ne`.
#[derive(Debug)]
pub struct EqualityValidator {
    negate: bool,
}

impl EqualityValidator {
    /// `eq` when `negate` is false, `ne` otherwise.
    #[must_use]
    pub const fn new(negate: bool) -> Self {
        Self { negate }
    }
}

impl Validator for EqualityValidator {
    fn name(&self) -> &'static str {
        if self.negate { "ne" } else { "eq" }
    }

    fn supported_kinds(&self) -> &'static [ValueKind] {
        ValueKind::ALL
    }

    fn validate(
        &self,
        key: &str,
        value: &ConfigValue,
        condition: &ValidatorCondition,
    ) -> Result<ValidationResult> {
        let expected = operand(condition)?;
        let equal = values_equal(value, &expected);
        Ok(ValidationResult::from_outcome(
            equal != self.negate,
            key,
            self.name(),
            value.clone(),
            &condition.message,
        ))
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Comparison operator of an [`OrderingValidator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `gt`
    Greater,
    /// `gte`
    GreaterOrEqual,
    /// `lt`
    Less,
    /// `lte`
    LessOrEqual,
}

impl Comparison {
    const fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Greater => matches!(ordering, Ordering::Greater),
            Self::GreaterOrEqual => !matches!(ordering, Ordering::Less),
            Self::Less => matches!(ordering, Ordering::Less),
            Self::LessOrEqual => !matches!(ordering, Ordering::Greater),
        }
    }
}

/// `gt` / `gte` / `lt` / `lte`.
#[derive(Debug)]
pub struct OrderingValidator {
    comparison: Comparison,
}

impl OrderingValidator {
    /// Creates an ordering validator.
    #[must_use]
    pub const fn new(comparison: Comparison) -> Self {
        Self { comparison }
    }
}

impl Validator for OrderingValidator {
    fn name(&self) -> &'static str {
        match self.comparison {
            Comparison::Greater => "gt",
            Comparison::GreaterOrEqual => "gte",
            Comparison::Less => "lt",
            Comparison::LessOrEqual => "lte",
        }
    }

    fn supported_kinds(&self) -> &'static [ValueKind] {
        ORDERED
    }

    fn validate(
        &self,
        key: &str,
        value: &ConfigValue,
        condition: &ValidatorCondition,
    ) -> Result<ValidationResult> {
        let expected = operand(condition)?;
        let ordering = compare_values(value, &expected)?;
        Ok(ValidationResult::from_outcome(
            self.comparison.accepts(ordering),
            key,
            self.name(),
            value.clone(),
            &condition.message,
        ))
    }
}

// ============================================================================
// Membership
// ============================================================================

/// `in`: the value must equal one of the listed options.
#[derive(Debug, Default)]
pub struct InValidator;

impl Validator for InValidator {
    fn name(&self) -> &'static str {
        "in"
    }

    fn supported_kinds(&self) -> &'static [ValueKind] {
        TEXTUAL
    }

    fn validate(
        &self,
        key: &str,
        value: &ConfigValue,
        condition: &ValidatorCondition,
    ) -> Result<ValidationResult> {
        let options = operand(condition)?.to_string_array().ok_or_else(|| {
            SGuardError::invalid_argument(
                "condition.value",
                "validator 'in' requires an array or comma-separated list",
            )
        })?;
        let found = options
            .iter()
            .any(|option| values_equal(value, &ConfigValue::String(option.clone())));
        Ok(ValidationResult::from_outcome(
            found,
            key,
            self.name(),
            value.clone(),
            &condition.message,
        ))
    }
}
