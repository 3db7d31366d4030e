//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Validates application settings files per environment against a rule set.
#[derive(Parser, Debug)]
#[command(name = "sguard", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "SGUARD_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "SGUARD_LOG_FORMAT")]
    pub log_format: OutputFormat,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate settings files against a rule set.
    Validate(ValidateArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Validate Command
// ============================================================================

/// Arguments for `validate`.
#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("target").multiple(false))]
pub struct ValidateArgs {
    /// Path to the rule set file (JSON or YAML).
    #[arg(env = "SGUARD_RULES")]
    pub rules: PathBuf,

    /// Environment to validate.
    #[arg(short, long, group = "target", env = "SGUARD_ENV")]
    pub env: Option<String>,

    /// Validate every environment (default when no environment is given).
    #[arg(short, long, group = "target")]
    pub all: bool,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Skip JSON Schema validation of the rule set.
    #[arg(long)]
    pub no_schema: bool,

    /// Skip structural validation of the rule set.
    #[arg(long)]
    pub no_structure: bool,
}

// ============================================================================
// Version Command
// ============================================================================

/// Arguments for `version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    #[value(alias = "text")]
    Human,
    /// JSON.
    Json,
}
