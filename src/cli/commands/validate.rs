//! `sguard validate`

use tokio_util::sync::CancellationToken;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::cli::report::{render_human, render_json};
use crate::config::LoaderOptions;
use crate::engine::RuleEngine;
use crate::error::{ExitCode, Result};

/// Validates one or every environment and prints the report.
///
/// Returns [`ExitCode::SUCCESS`] when every check passed and
/// [`ExitCode::VALIDATION_FAILED`] otherwise.
///
/// # Errors
///
/// Returns an error if the rule set cannot be loaded, the environment is
/// unknown, or a critical error occurs.
pub async fn run(
    args: &ValidateArgs,
    verbose: bool,
    quiet: bool,
    cancel: CancellationToken,
) -> Result<i32> {
    let options = LoaderOptions {
        validate_schema: !args.no_schema,
        validate_structure: !args.no_structure,
        ..LoaderOptions::default()
    };
    let engine = RuleEngine::new(options);

    tracing::info!(rules = %args.rules.display(), environment = ?args.env, "validating");
    let result = match &args.env {
        Some(environment) => {
            engine
                .validate_environment_async(args.rules.clone(), environment.clone())
                .await?
        }
        None => {
            engine
                .validate_all_environments_async(args.rules.clone(), Some(cancel))
                .await?
        }
    };

    let print = !quiet || !result.success;
    if print {
        match args.format {
            OutputFormat::Human => print!("{}", render_human(&result, verbose)),
            OutputFormat::Json => println!("{}", render_json(&result)?),
        }
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::VALIDATION_FAILED
    })
}
