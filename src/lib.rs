//! `SGuard` - per-environment configuration validation
//!
//! Loads a rule set describing deployment environments and the checks their
//! settings files must pass, then validates each environment's settings and
//! reports pass/fail per key.
//!
//! ```no_run
//! use std::path::Path;
//! use sguard::{LoaderOptions, RuleEngine};
//!
//! let engine = RuleEngine::new(LoaderOptions::default());
//! let result = engine.validate_all_environments(Path::new("sguard.json"))?;
//! assert!(result.success);
//! # Ok::<(), sguard::SGuardError>(())
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod observability;
pub mod security;
pub mod validators;

pub use config::{ConfigLoader, DocumentLoader, LoaderOptions, SecurityLimits};
pub use engine::{FileValidationResult, FileValidator, RuleEngine, RuleEngineResult};
pub use error::{ConfigError, ExitCode, Result, SGuardError};
pub use security::SecurePathResolver;
pub use validators::{Validator, ValidatorRegistry};
