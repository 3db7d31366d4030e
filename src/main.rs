//! `sguard` - per-environment configuration validation

use clap::Parser;
use tokio_util::sync::CancellationToken;

use sguard::cli::args::{Cli, OutputFormat};
use sguard::cli::commands;
use sguard::error::ExitCode;
use sguard::observability::{LogFormat, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        let format = match cli.log_format {
            OutputFormat::Human => LogFormat::Human,
            OutputFormat::Json => LogFormat::Json,
        };
        init_logging(format, cli.verbose, cli.color);
    }

    // First Ctrl+C stops batch validation between environments, second exits.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("\nStopping after the current environment... (press Ctrl+C again to force)");
        signal_cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(ExitCode::INTERRUPTED);
        }
    });

    match commands::dispatch(cli, cancel).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
