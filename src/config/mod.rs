//! Rule set and settings configuration
//!
//! Loads rule sets and environment settings files (JSON or YAML), applies
//! size and count guards, and validates rule set structure.

pub mod flatten;
pub mod loader;
pub mod schema;
pub mod schema_check;
pub mod structure;
pub mod yaml;

pub use crate::error::ConfigError;
pub use flatten::{FlattenedSettings, KEY_SEPARATOR, flatten_value};
pub use loader::{ConfigLoader, DocumentLoader, LoaderOptions, SecurityLimits};
pub use schema::*;
pub use schema_check::{JsonSchemaValidator, SchemaValidationResult, SchemaValidator, discover_schema};
pub use structure::{ConfigStructureValidator, validate_path_format};
pub use yaml::YamlLoader;
