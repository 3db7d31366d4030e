//! Rule set schema types
//!
//! These types are deserialized from rule set files (JSON or YAML). Every
//! field is lenient: missing or `null` members fall back to empty defaults so
//! that structural problems are reported by
//! [`ConfigStructureValidator`](crate::config::structure::ConfigStructureValidator)
//! as data instead of failing the parse.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Rule Set
// ============================================================================

/// Root of a rule set file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Rule set format version (required, non-empty)
    #[serde(default, deserialize_with = "nullable")]
    pub version: String,

    /// Deployment environments, in declaration order
    #[serde(default, deserialize_with = "nullable")]
    pub environments: Vec<Environment>,

    /// Rules, in declaration order
    #[serde(default, deserialize_with = "nullable")]
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Finds an environment by id, ignoring ASCII case.
    #[must_use]
    pub fn environment(&self, id: &str) -> Option<&Environment> {
        self.environments
            .iter()
            .find(|env| env.id.eq_ignore_ascii_case(id))
    }

    /// Declared environment ids, in order.
    #[must_use]
    pub fn environment_ids(&self) -> Vec<String> {
        self.environments.iter().map(|env| env.id.clone()).collect()
    }

    /// Rules whose environment list contains `environment_id` (ASCII case
    /// insensitive), in declaration order.
    #[must_use]
    pub fn rules_for(&self, environment_id: &str) -> Vec<Rule> {
        self.rules
            .iter()
            .filter(|rule| rule.applies_to(environment_id))
            .cloned()
            .collect()
    }
}

// ============================================================================
// Environment
// ============================================================================

/// A deployment target with its own settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Unique identifier (e.g. `prod`)
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,

    /// Display name
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,

    /// Settings file locator, relative to the rule set file
    #[serde(default, deserialize_with = "nullable")]
    pub path: String,

    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================================
// Rules
// ============================================================================

/// Binds a set of environments to a [`RuleDetail`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier across the rule set
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,

    /// Environment ids this rule applies to. `None` entries are `null` in
    /// the source document.
    #[serde(default, deserialize_with = "nullable")]
    pub environments: Vec<Option<String>>,

    /// Conditions to check
    #[serde(rename = "rule", default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<RuleDetail>,
}

impl Rule {
    /// Returns `true` when the rule targets `environment_id` (ASCII case
    /// insensitive).
    #[must_use]
    pub fn applies_to(&self, environment_id: &str) -> bool {
        self.environments
            .iter()
            .flatten()
            .any(|id| id.eq_ignore_ascii_case(environment_id))
    }
}

/// The checks a rule performs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDetail {
    /// Identifier of the detail block
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,

    /// Conditions, one per configuration key
    #[serde(default, deserialize_with = "nullable")]
    pub conditions: Vec<Condition>,
}

/// A configuration key plus the validators applied to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Flattened settings key (`Logging:Level` or `Logging.Level`)
    #[serde(default, deserialize_with = "nullable")]
    pub key: String,

    /// Validators to run against the key's value
    #[serde(rename = "condition", default, deserialize_with = "nullable")]
    pub validators: Vec<ValidatorCondition>,
}

/// One named check applied to a key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorCondition {
    /// Validator type name (`required`, `min_len`, ...)
    #[serde(rename = "validator", default, deserialize_with = "nullable")]
    pub validator_type: String,

    /// Operand for comparison validators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Message reported when the check fails
    #[serde(default, deserialize_with = "nullable")]
    pub message: String,
}

impl ValidatorCondition {
    /// Convenience constructor used by tests and programmatic callers.
    #[must_use]
    pub fn new(validator_type: &str, value: Option<Value>, message: &str) -> Self {
        Self {
            validator_type: validator_type.to_string(),
            value,
            message: message.to_string(),
        }
    }
}

/// Treats an explicit `null` like a missing member.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
