//! Equality and ordering over [`ConfigValue`]s of mixed origin.

use std::cmp::Ordering;

use crate::error::{Result, SGuardError};

use super::value::ConfigValue;

/// Loose equality used by `eq`, `ne` and `in`.
///
/// Numbers compare numerically whatever their origin, containers compare
/// structurally, everything else by text. Null never equals a value.
#[must_use]
pub fn values_equal(actual: &ConfigValue, expected: &ConfigValue) -> bool {
    if actual.is_null() || expected.is_null() {
        return false;
    }
    if let (Some(a), Some(b)) = (actual.to_number(), expected.to_number()) {
        return (a - b).abs() <= f64::EPSILON * a.abs().max(b.abs()).max(1.0);
    }
    match (actual, expected) {
        (ConfigValue::Raw(a), ConfigValue::Raw(b)) if actual.is_container() => a == b,
        _ => actual.to_text() == expected.to_text(),
    }
}

/// Orders `actual` relative to `expected`.
///
/// # Errors
///
/// Returns [`SGuardError::InvalidArgument`] when either side is null, when
/// only one side is numeric, or when either side is an array or object.
pub fn compare_values(actual: &ConfigValue, expected: &ConfigValue) -> Result<Ordering> {
    if actual.is_null() {
        return Err(SGuardError::invalid_argument(
            "value",
            "cannot compare a null value",
        ));
    }
    if expected.is_null() {
        return Err(SGuardError::invalid_argument(
            "condition.value",
            "cannot compare against a null value",
        ));
    }
    if actual.is_container() || expected.is_container() {
        return Err(SGuardError::invalid_argument(
            "value",
            format!(
                "values of kind {:?} and {:?} are not comparable",
                actual.kind(),
                expected.kind()
            ),
        ));
    }

    match (actual.to_number(), expected.to_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(|| {
            SGuardError::invalid_argument("value", format!("cannot order {a} and {b}"))
        }),
        (None, Some(_)) => Err(not_a_number("value", actual)),
        (Some(_), None) => Err(not_a_number("condition.value", expected)),
        (None, None) => match (actual, expected) {
            (ConfigValue::Bool(a), ConfigValue::Bool(b)) => Ok(a.cmp(b)),
            _ => Ok(actual.to_text().cmp(&expected.to_text())),
        },
    }
}

fn not_a_number(argument: &str, value: &ConfigValue) -> SGuardError {
    SGuardError::invalid_argument(
        argument,
        format!(
            "'{}' cannot be interpreted as a number",
            value.to_text().unwrap_or_default()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(value: serde_json::Value) -> ConfigValue {
        ConfigValue::from_json(&value)
    }

    #[test]
    fn test_numeric_equality_across_origins() {
        assert!(values_equal(&v(json!("10")), &v(json!(10))));
        assert!(values_equal(&v(json!(1.0)), &v(json!(1))));
        assert!(!values_equal(&v(json!("10")), &v(json!(11))));
    }

    #[test]
    fn test_text_and_container_equality() {
        assert!(values_equal(&v(json!("Info")), &v(json!("Info"))));
        assert!(!values_equal(&v(json!("info")), &v(json!("Info"))));
        assert!(values_equal(&v(json!([1, 2])), &v(json!([1, 2]))));
        assert!(values_equal(&v(json!(true)), &v(json!("true"))));
        assert!(!values_equal(&ConfigValue::Null, &ConfigValue::Null));
    }

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(compare_values(&v(json!("9")), &v(json!(10))).unwrap(), Ordering::Less);
        assert_eq!(compare_values(&v(json!(3.5)), &v(json!("3.5"))).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_natural_ordering_for_text() {
        assert_eq!(
            compare_values(&v(json!("beta")), &v(json!("alpha"))).unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&v(json!(false)), &v(json!(true))).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_incomparable_values_are_errors() {
        assert!(compare_values(&ConfigValue::Null, &v(json!(1))).is_err());
        assert!(compare_values(&v(json!(1)), &ConfigValue::Null).is_err());
        assert!(compare_values(&v(json!("abc")), &v(json!(1))).is_err());
        assert!(compare_values(&v(json!({"a": 1})), &v(json!({"b": 2}))).is_err());
    }
}
