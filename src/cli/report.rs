//! Rendering of [`RuleEngineResult`]s for the terminal.

use std::fmt::Write as _;

use crate::engine::{FileValidationResult, RuleEngineResult};
use crate::error::Result;
use crate::validators::ConfigValue;

/// Renders a human-readable report.
///
/// `verbose` also lists passing checks.
#[must_use]
pub fn render_human(result: &RuleEngineResult, verbose: bool) -> String {
    let mut out = String::new();
    for file in result.files() {
        render_file(&mut out, file, verbose);
    }

    let checks: usize = result.files().iter().map(|f| f.results.len()).sum();
    let failed = result.failure_count();
    let _ = writeln!(
        out,
        "{}: {checks} checks, {failed} failed across {} environment(s)",
        if result.success { "PASSED" } else { "FAILED" },
        result.files().len()
    );
    if let Some(message) = &result.error_message {
        let _ = writeln!(out, "{message}");
    }
    out
}

fn render_file(out: &mut String, file: &FileValidationResult, verbose: bool) {
    let environment = file.environment.as_deref().unwrap_or("-");
    let _ = writeln!(out, "Environment: {environment} ({})", file.file_id);
    for entry in &file.results {
        if entry.is_valid {
            if verbose {
                let _ = writeln!(out, "  ok    {} [{}]", entry.key, entry.validator_type);
            }
            continue;
        }
        let _ = writeln!(
            out,
            "  FAIL  {} [{}] {} (actual: {})",
            entry.key,
            entry.validator_type,
            entry.message,
            display_value(&entry.actual_value)
        );
        if let Some(error) = &entry.error {
            let _ = writeln!(out, "        error: {error}");
        }
    }
}

fn display_value(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Null => "null".to_string(),
        ConfigValue::String(s) => format!("{s:?}"),
        other => other.to_text().unwrap_or_default(),
    }
}

/// Renders the result as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(result: &RuleEngineResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::ValidationResult;

    fn sample() -> RuleEngineResult {
        let mut file = FileValidationResult::new("/srv/app/prod.json");
        file.environment = Some("prod".to_string());
        file.results
            .push(ValidationResult::success("Logging:Level", "required", ConfigValue::from("Warning")));
        file.results.push(
            ValidationResult::failure("Server:Port", "gt", ConfigValue::from("80"), "port too low")
                .with_error("detail"),
        );
        RuleEngineResult::single(file)
    }

    #[test]
    fn human_report_lists_failures() {
        let report = render_human(&sample(), false);
        assert!(report.contains("Environment: prod (/srv/app/prod.json)"));
        assert!(report.contains("FAIL  Server:Port [gt] port too low (actual: \"80\")"));
        assert!(report.contains("error: detail"));
        assert!(!report.contains("Logging:Level"));
        assert!(report.contains("FAILED: 2 checks, 1 failed across 1 environment(s)"));
    }

    #[test]
    fn verbose_report_lists_passes() {
        assert!(render_human(&sample(), true).contains("ok    Logging:Level [required]"));
    }

    #[test]
    fn json_report_round_trips_as_value() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&sample()).unwrap()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["outcome"]["files"]["results"][1]["message"], "port too low");
    }
}
