//! Value validators and their registry
//!
//! Each validator is a named check applied to one flattened settings value.
//! The registry maps validator-type names used in rule sets to
//! implementations. It is populated explicitly; there is no runtime
//! discovery.

pub mod builtin;
pub mod compare;
pub mod result;
pub mod value;

pub use builtin::{
    Comparison, EqualityValidator, InValidator, LengthBound, LengthValidator, OrderingValidator,
    RequiredValidator,
};
pub use result::ValidationResult;
pub use value::{ConfigValue, ValueKind};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::schema::ValidatorCondition;
use crate::error::{Result, SGuardError};

/// Validator type names whose conditions must carry a `value`.
pub const VALUE_REQUIRED: &[&str] = &[
    "min_len", "max_len", "eq", "ne", "gt", "gte", "lt", "lte", "in",
];

/// A named check applied to a single value.
pub trait Validator: Send + Sync + std::fmt::Debug {
    /// Validator type name as used in rule sets.
    fn name(&self) -> &'static str;

    /// Value kinds this validator handles natively.
    fn supported_kinds(&self) -> &'static [ValueKind];

    /// Applies the check to `value`, the current value of `key`.
    ///
    /// A failed check is an `Ok` result with `is_valid == false`.
    ///
    /// # Errors
    ///
    /// Returns [`SGuardError::InvalidArgument`] when the condition operand is
    /// missing or malformed, or when the values cannot be compared.
    fn validate(
        &self,
        key: &str,
        value: &ConfigValue,
        condition: &ValidatorCondition,
    ) -> Result<ValidationResult>;
}

/// Name → validator map.
#[derive(Debug, Clone)]
pub struct ValidatorRegistry {
    validators: BTreeMap<String, Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            validators: BTreeMap::new(),
        }
    }

    /// Creates a registry with every built-in validator.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(RequiredValidator));
        registry.register(Arc::new(LengthValidator::new(LengthBound::Min)));
        registry.register(Arc::new(LengthValidator::new(LengthBound::Max)));
        registry.register(Arc::new(EqualityValidator::new(false)));
        registry.register(Arc::new(EqualityValidator::new(true)));
        registry.register(Arc::new(OrderingValidator::new(Comparison::Greater)));
        registry.register(Arc::new(OrderingValidator::new(Comparison::GreaterOrEqual)));
        registry.register(Arc::new(OrderingValidator::new(Comparison::Less)));
        registry.register(Arc::new(OrderingValidator::new(Comparison::LessOrEqual)));
        registry.register(Arc::new(InValidator));
        registry
    }

    /// Registers a validator under its own name, replacing any previous one.
    pub fn register(&mut self, validator: Arc<dyn Validator>) {
        self.validators
            .insert(validator.name().to_string(), validator);
    }

    /// Looks up a validator by type name.
    ///
    /// # Errors
    ///
    /// Returns [`SGuardError::UnsupportedValidator`] listing every known name
    /// when `name` is not registered.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Validator>> {
        self.validators
            .get(name)
            .cloned()
            .ok_or_else(|| SGuardError::UnsupportedValidator {
                name: name.to_string(),
                known: self.validators.keys().cloned().collect(),
            })
    }

    /// Registered validator names, sorted.
    #[must_use]
    pub fn known_names(&self) -> BTreeSet<String> {
        self.validators.keys().cloned().collect()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
