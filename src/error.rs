//! Error types for `SGuard`
//!
//! Load-time, security and exceptional conditions are errors. Per-field rule
//! set violations and per-value validator failures are reported as data and
//! never surface through these types.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `sguard` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// All validations passed
    pub const SUCCESS: i32 = 0;

    /// At least one validation failed
    pub const VALIDATION_FAILED: i32 = 1;

    /// Configuration error (malformed rule set, schema or structure failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Security error (path escapes the allowed directory)
    pub const SECURITY_ERROR: i32 = 4;

    /// Usage error (invalid arguments, unknown environment)
    pub const USAGE_ERROR: i32 = 64;

    /// Internal error (resource exhaustion, panic during validation)
    pub const INTERNAL_ERROR: i32 = 70;

    /// Interrupted by SIGINT or cancelled before completion
    pub const INTERRUPTED: i32 = 130;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `SGuard` operations.
#[derive(Debug, Error)]
pub enum SGuardError {
    /// Bad call-site input
    #[error("invalid argument '{argument}': {reason}")]
    InvalidArgument {
        /// Name of the offending argument
        argument: String,
        /// Why it was rejected
        reason: String,
    },

    /// Rule set or settings file does not exist
    #[error("file not found: {}", .path.display())]
    FileNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Requested environment is not declared in the rule set
    #[error("environment '{id}' not found. Available environments: {}", .available.join(", "))]
    EnvironmentNotFound {
        /// Requested environment id
        id: String,
        /// Environment ids declared in the rule set
        available: Vec<String>,
    },

    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Resolved path escapes the permitted base directory
    #[error("access denied: '{}' resolves outside of '{}'", .path.display(), .base.display())]
    UnauthorizedAccess {
        /// Resolved (or symlink target) path
        path: PathBuf,
        /// Directory the path had to stay within
        base: PathBuf,
    },

    /// Validator type is not registered
    #[error("validator type '{name}' is not supported. Known validators: {}", .known.join(", "))]
    UnsupportedValidator {
        /// Requested validator name
        name: String,
        /// Registered validator names
        known: Vec<String>,
    },

    /// I/O error while touching a file
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Memory or another bounded resource could not be obtained
    #[error("resource exhausted while {context}: {message}")]
    ResourceExhausted {
        /// Operation that was running
        context: String,
        /// Details from the failing allocation or call
        message: String,
    },

    /// A panic was caught while validating one environment
    #[error("validation of environment '{environment}' panicked: {message}")]
    Panicked {
        /// Environment being processed
        environment: String,
        /// Panic payload, if it was a string
        message: String,
    },

    /// The run was cancelled before every environment was processed
    #[error("validation cancelled after {completed} of {total} environments")]
    Cancelled {
        /// Environments processed before cancellation
        completed: usize,
        /// Environments in the rule set
        total: usize,
    },

    /// Several critical errors collected during a batch run
    #[error("{} critical errors occurred: {}", .0.len(), join_errors(.0))]
    Aggregate(Vec<SGuardError>),
}

impl SGuardError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) | Self::UnsupportedValidator { .. } => {
                ExitCode::CONFIG_ERROR
            }
            Self::FileNotFound { .. } | Self::Io { .. } => ExitCode::IO_ERROR,
            Self::UnauthorizedAccess { .. } => ExitCode::SECURITY_ERROR,
            Self::InvalidArgument { .. } | Self::EnvironmentNotFound { .. } => {
                ExitCode::USAGE_ERROR
            }
            Self::ResourceExhausted { .. } | Self::Panicked { .. } | Self::Aggregate(_) => {
                ExitCode::INTERNAL_ERROR
            }
            Self::Cancelled { .. } => ExitCode::INTERRUPTED,
        }
    }

    /// Returns `true` for errors that must not be swallowed by batch isolation.
    ///
    /// The critical class is resource exhaustion (including I/O failures of
    /// kind `OutOfMemory`), panics caught during validation, and aggregates
    /// made only of critical errors. Every other error is ordinary and is
    /// contained to the environment that raised it.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        match self {
            Self::ResourceExhausted { .. } | Self::Panicked { .. } => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::OutOfMemory,
            Self::Aggregate(errors) => !errors.is_empty() && errors.iter().all(Self::is_critical),
            _ => false,
        }
    }

    /// Returns `true` for the not-found family (missing file or environment).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. } | Self::EnvironmentNotFound { .. }
        )
    }

    /// Shorthand for [`SGuardError::InvalidArgument`].
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    /// Wraps an I/O error, promoting out-of-memory conditions to
    /// [`SGuardError::ResourceExhausted`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::OutOfMemory {
            return Self::ResourceExhausted {
                context: format!("reading {}", path.display()),
                message: source.to_string(),
            };
        }
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::FileNotFound { path };
        }
        Self::Io { path, source }
    }
}

fn join_errors(errors: &[SGuardError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Rule set and settings loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File exists but has no content
    #[error("configuration file is empty: {}", .path.display())]
    Empty {
        /// Path to the file
        path: PathBuf,
    },

    /// File exceeds the configured size limit
    #[error("configuration file {} is {size} bytes, exceeding the maximum of {limit} bytes", .path.display())]
    FileTooLarge {
        /// Path to the file
        path: PathBuf,
        /// Actual size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// JSON or YAML parsing failed
    #[error("parse error in {}: {message}", .path.display())]
    Parse {
        /// Path to the file (empty for in-memory content)
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// A count-based guard was exceeded
    #[error("rule set contains {count} {what}, exceeding the maximum of {limit}")]
    LimitExceeded {
        /// What was counted ("environments", "rules", ...)
        what: String,
        /// Actual count
        count: usize,
        /// Configured limit
        limit: usize,
    },

    /// Rule set does not declare any environment
    #[error("rule set {} must define at least one environment", .path.display())]
    NoEnvironments {
        /// Path to the rule set
        path: PathBuf,
    },

    /// Rule set failed JSON-Schema validation
    #[error("rule set {} does not match schema {}: {}", .path.display(), .schema.display(), .errors.join("; "))]
    SchemaMismatch {
        /// Path to the rule set
        path: PathBuf,
        /// Schema that was applied
        schema: PathBuf,
        /// Every schema violation found
        errors: Vec<String>,
    },

    /// Rule set failed structural validation
    #[error("rule set {} is invalid: {}", .path.display(), .errors.join("; "))]
    StructureInvalid {
        /// Path to the rule set
        path: PathBuf,
        /// Every structural violation found
        errors: Vec<String>,
    },
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `SGuard` operations.
pub type Result<T> = std::result::Result<T, SGuardError>;

// ============================================================================
// Tests
// ============================================================================
