//! Structural validation of rule sets
//!
//! Checks the relationships serde cannot express: required members,
//! uniqueness of ids, cross references between rules and environments,
//! per-rule limits and settings path hygiene.
//!
//! Validation collects every problem instead of stopping at the first one.
//! Each message is prefixed with the JSON path of the offending member.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::config::loader::SecurityLimits;
use crate::config::schema::{Condition, Environment, Rule, RuleSet, ValidatorCondition};
use crate::validators::VALUE_REQUIRED;

/// Maximum edit distance for a "did you mean" suggestion.
const SUGGESTION_DISTANCE: usize = 2;

/// Runs of `..` segments longer than this are rejected.
const MAX_PARENT_SEGMENTS: usize = 2;

/// Validates the structure of a [`RuleSet`].
#[derive(Debug, Clone)]
pub struct ConfigStructureValidator {
    max_conditions_per_rule: usize,
    max_validators_per_condition: usize,
    max_path_length: usize,
}

impl ConfigStructureValidator {
    /// Creates a validator bounded by `limits`.
    #[must_use]
    pub const fn new(limits: &SecurityLimits) -> Self {
        Self {
            max_conditions_per_rule: limits.max_conditions_per_rule,
            max_validators_per_condition: limits.max_validators_per_condition,
            max_path_length: limits.max_path_length,
        }
    }

    /// Validates `rule_set`, returning every problem found. An empty list
    /// means the rule set is valid.
    ///
    /// `known_validators` is the set of validator type names rules may use.
    #[must_use]
    pub fn validate(&self, rule_set: &RuleSet, known_validators: &BTreeSet<String>) -> Vec<String> {
        let mut pass = Pass {
            limits: self,
            known_validators,
            errors: Vec::new(),
        };

        if rule_set.version.trim().is_empty() {
            pass.add_error("$.version", "Version is required");
        }
        if rule_set.rules.is_empty() {
            pass.add_error("$.rules", "No rules defined. Rule set contains 0 rules.");
        }

        for (index, environment) in rule_set.environments.iter().enumerate() {
            pass.check_environment(index, environment);
        }
        pass.check_duplicates(
            "environment",
            "$.environments",
            rule_set.environments.iter().map(|env| env.id.as_str()),
        );

        for (index, rule) in rule_set.rules.iter().enumerate() {
            pass.check_rule(index, rule);
        }
        pass.check_duplicates(
            "rule",
            "$.rules",
            rule_set.rules.iter().map(|rule| rule.id.as_str()),
        );

        pass.check_environment_references(rule_set);
        pass.errors
    }
}

/// Validates the format of an environment settings path.
///
/// Returns a description of the first problem found, or `None` when the
/// path is acceptable.
#[must_use]
pub fn validate_path_format(path: &str, max_path_length: usize) -> Option<String> {
    if path.contains('\0') {
        return Some("Path contains a NUL character".to_string());
    }
    if path
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\r' | '\n'))
    {
        return Some("Path contains control characters".to_string());
    }
    if cfg!(windows) {
        if let Some(c) = path.chars().find(|c| matches!(c, '<' | '>' | '"' | '|' | '?' | '*')) {
            return Some(format!("Path contains invalid character '{c}'"));
        }
    }
    if path.chars().count() > max_path_length {
        return Some(format!(
            "Path is {} characters long, exceeding the maximum of {max_path_length}",
            path.chars().count()
        ));
    }

    let segments: Vec<&str> = path.split(['/', '\\']).collect();
    let mut parent_run = 0;
    for segment in &segments {
        if *segment == ".." {
            parent_run += 1;
            if parent_run > MAX_PARENT_SEGMENTS {
                return Some(format!(
                    "Path contains more than {MAX_PARENT_SEGMENTS} consecutive '..' segments"
                ));
            }
        } else {
            parent_run = 0;
        }
    }

    if path.contains("//") || path.contains("\\\\") {
        return Some("Path contains consecutive separators".to_string());
    }

    let absolute = Path::new(path).is_absolute() || path.starts_with(['/', '\\']);
    if absolute && segments.contains(&"..") {
        return Some("Absolute path must not contain '..' segments".to_string());
    }
    None
}

/// Closest known validator name within [`SUGGESTION_DISTANCE`] edits.
fn suggest_validator(input: &str, known: &BTreeSet<String>) -> Option<String> {
    let lowered = input.to_ascii_lowercase();
    known
        .iter()
        .map(|name| (name, strsim::damerau_levenshtein(&lowered, name)))
        .filter(|(_, distance)| *distance <= SUGGESTION_DISTANCE)
        .min_by_key(|(_, distance)| *distance)
        .map(|(name, _)| name.clone())
}

struct Pass<'a> {
    limits: &'a ConfigStructureValidator,
    known_validators: &'a BTreeSet<String>,
    errors: Vec<String>,
}

impl Pass<'_> {
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(format!("{path}: {message}"));
    }

    // ========================================================================
    // Environments
    // ========================================================================

    fn check_environment(&mut self, index: usize, environment: &Environment) {
        let base = format!("$.environments[{index}]");
        if environment.id.trim().is_empty() {
            self.add_error(&format!("{base}.id"), "Environment id is required");
        }
        if environment.name.trim().is_empty() {
            self.add_error(&format!("{base}.name"), "Environment name is required");
        }
        if environment.path.trim().is_empty() {
            self.add_error(&format!("{base}.path"), "Environment path is required");
        } else if let Some(problem) =
            validate_path_format(&environment.path, self.limits.max_path_length)
        {
            self.add_error(
                &format!("{base}.path"),
                &format!("Invalid path '{}': {problem}", environment.path.escape_debug()),
            );
        }
    }

    /// Reports each duplicated id once, listing every index it appears at.
    fn check_duplicates<'s>(
        &mut self,
        what: &str,
        base: &str,
        ids: impl Iterator<Item = &'s str>,
    ) {
        let mut positions: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, id) in ids.enumerate() {
            if !id.trim().is_empty() {
                positions.entry(id.to_ascii_lowercase()).or_default().push(index);
            }
        }
        for (id, indexes) in positions.into_iter().filter(|(_, idx)| idx.len() > 1) {
            let locations: Vec<String> = indexes.iter().map(|i| format!("{base}[{i}]")).collect();
            self.add_error(
                base,
                &format!(
                    "Duplicate {what} id '{id}' found at {}",
                    locations.join(", ")
                ),
            );
        }
    }

    // ========================================================================
    // Rules
    // ========================================================================

    fn check_rule(&mut self, index: usize, rule: &Rule) {
        let base = format!("$.rules[{index}]");
        if rule.id.trim().is_empty() {
            self.add_error(&format!("{base}.id"), "Rule id is required");
        }

        if rule.environments.is_empty() {
            self.add_error(
                &format!("{base}.environments"),
                "Rule must reference at least one environment",
            );
        }
        for (env_index, entry) in rule.environments.iter().enumerate() {
            if entry.as_deref().is_none_or(|id| id.trim().is_empty()) {
                self.add_error(
                    &format!("{base}.environments[{env_index}]"),
                    "Environment reference must not be null or empty",
                );
            }
        }

        let Some(detail) = &rule.detail else {
            self.add_error(&format!("{base}.rule"), "Rule detail is required");
            return;
        };
        if detail.id.trim().is_empty() {
            self.add_error(&format!("{base}.rule.id"), "Rule detail id is required");
        }

        let conditions_path = format!("{base}.rule.conditions");
        if detail.conditions.is_empty() {
            self.add_error(&conditions_path, "Rule must define at least one condition");
            return;
        }
        if detail.conditions.len() > self.limits.max_conditions_per_rule {
            self.add_error(
                &conditions_path,
                &format!(
                    "Rule defines {} conditions, exceeding the maximum of {}",
                    detail.conditions.len(),
                    self.limits.max_conditions_per_rule
                ),
            );
            return;
        }
        for (cond_index, condition) in detail.conditions.iter().enumerate() {
            self.check_condition(&format!("{conditions_path}[{cond_index}]"), condition);
        }
    }

    fn check_condition(&mut self, base: &str, condition: &Condition) {
        if condition.key.trim().is_empty() {
            self.add_error(&format!("{base}.key"), "Condition key is required");
        }

        let validators_path = format!("{base}.condition");
        if condition.validators.is_empty() {
            self.add_error(&validators_path, "Condition must define at least one validator");
            return;
        }
        if condition.validators.len() > self.limits.max_validators_per_condition {
            self.add_error(
                &validators_path,
                &format!(
                    "Condition defines {} validators, exceeding the maximum of {}",
                    condition.validators.len(),
                    self.limits.max_validators_per_condition
                ),
            );
            return;
        }
        for (index, validator) in condition.validators.iter().enumerate() {
            self.check_validator(&format!("{validators_path}[{index}]"), validator);
        }
    }

    fn check_validator(&mut self, base: &str, validator: &ValidatorCondition) {
        let kind = validator.validator_type.trim();
        if kind.is_empty() {
            self.add_error(&format!("{base}.validator"), "Validator type is required");
        } else if !self.known_validators.contains(kind) {
            let known: Vec<&str> = self.known_validators.iter().map(String::as_str).collect();
            let mut message = format!(
                "Unknown validator type '{kind}'. Known validators: {}",
                known.join(", ")
            );
            if let Some(suggestion) = suggest_validator(kind, self.known_validators) {
                message.push_str(&format!(". Did you mean '{suggestion}'?"));
            }
            self.add_error(&format!("{base}.validator"), &message);
        }

        if validator.message.trim().is_empty() {
            self.add_error(&format!("{base}.message"), "Validator message is required");
        }

        let needs_value = VALUE_REQUIRED.contains(&kind);
        let has_value = validator.value.as_ref().is_some_and(|v| !v.is_null());
        if needs_value && !has_value {
            self.add_error(
                &format!("{base}.value"),
                &format!("Validator '{kind}' requires a value"),
            );
        }
    }

    // ========================================================================
    // Cross References
    // ========================================================================

    fn check_environment_references(&mut self, rule_set: &RuleSet) {
        let available = rule_set.environment_ids();
        for (index, rule) in rule_set.rules.iter().enumerate() {
            for (env_index, id) in rule.environments.iter().enumerate() {
                let Some(id) = id.as_deref().filter(|id| !id.trim().is_empty()) else {
                    continue;
                };
                if rule_set.environment(id).is_none() {
                    self.add_error(
                        &format!("$.rules[{index}].environments[{env_index}]"),
                        &format!(
                            "Environment '{id}' is not defined. Available environments: {}",
                            available.join(", ")
                        ),
                    );
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
