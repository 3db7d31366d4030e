//! CLI command dispatch and handlers.

pub mod validate;
pub mod version;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands};
use crate::error::{ExitCode, Result};

/// Dispatch a parsed CLI invocation, returning the process exit code.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<i32> {
    match cli.command {
        Commands::Validate(args) => validate::run(&args, cli.verbose > 0, cli.quiet, cancel).await,
        Commands::Version(args) => {
            version::run(&args);
            Ok(ExitCode::SUCCESS)
        }
    }
}
