//! Rule application and environment orchestration.

pub mod file_validator;
pub mod result;
pub mod rule_engine;

pub use file_validator::FileValidator;
pub use result::{FileValidationResult, RuleEngineResult, ValidationOutcome};
pub use rule_engine::RuleEngine;
