//! JSON-Schema validation of rule set files
//!
//! Rule sets may ship with a JSON Schema next to them. When one is found it
//! is applied to the raw document before deserialization, so schema errors
//! point at the document the operator wrote.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::config::loader::SecurityLimits;
use crate::error::{ConfigError, Result, SGuardError};

/// Schema file names looked up next to every rule set, after the
/// rule-set-specific candidates.
pub const SHARED_SCHEMA_NAMES: &[&str] = &["sguard.schema.json", "appsettings.sguard.schema.json"];

/// Outcome of a schema check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaValidationResult {
    /// `true` when the document satisfies the schema
    pub is_valid: bool,
    /// Every violation found
    pub errors: Vec<String>,
}

/// Validates a JSON document against a schema file.
pub trait SchemaValidator: Send + Sync + std::fmt::Debug {
    /// Checks `json` against the schema stored at `schema_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be read or compiled, or if
    /// `json` is not valid JSON. Violations are reported in the result.
    fn validate(&self, json: &str, schema_path: &Path) -> Result<SchemaValidationResult>;
}

type CacheKey = (PathBuf, Option<SystemTime>);

/// [`SchemaValidator`] backed by the `jsonschema` crate.
///
/// Compiled schemas are cached per path and modification time, so edits to a
/// schema file are picked up without restarting. Schema files larger than
/// the configured limit are rejected before they are read.
pub struct JsonSchemaValidator {
    compiled: DashMap<CacheKey, Arc<jsonschema::Validator>>,
    max_file_size_bytes: u64,
}

impl Default for JsonSchemaValidator {
    fn default() -> Self {
        Self::with_max_file_size(SecurityLimits::default().max_file_size_bytes)
    }
}

impl std::fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("cached_schemas", &self.compiled.len())
            .field("max_file_size_bytes", &self.max_file_size_bytes)
            .finish()
    }
}

impl JsonSchemaValidator {
    /// Creates a validator with an empty schema cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a validator rejecting schema files above `max_file_size_bytes`.
    #[must_use]
    pub fn with_max_file_size(max_file_size_bytes: u64) -> Self {
        Self {
            compiled: DashMap::new(),
            max_file_size_bytes,
        }
    }

    /// Number of compiled schemas currently cached.
    #[must_use]
    pub fn cached_schemas(&self) -> usize {
        self.compiled.len()
    }

    fn compile(&self, schema_path: &Path) -> Result<Arc<jsonschema::Validator>> {
        let metadata = fs::metadata(schema_path).map_err(|e| SGuardError::io(schema_path, e))?;
        let size = metadata.len();
        if size > self.max_file_size_bytes {
            return Err(ConfigError::FileTooLarge {
                path: schema_path.to_path_buf(),
                size,
                limit: self.max_file_size_bytes,
            }
            .into());
        }

        let key = (schema_path.to_path_buf(), metadata.modified().ok());
        if let Some(existing) = self.compiled.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        let text = fs::read_to_string(schema_path).map_err(|e| SGuardError::io(schema_path, e))?;
        let schema: Value = serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: schema_path.to_path_buf(),
            line: Some(e.line()),
            message: e.to_string(),
        })?;
        let validator = jsonschema::options()
            .build(&schema)
            .map_err(|e| ConfigError::Parse {
                path: schema_path.to_path_buf(),
                line: None,
                message: format!("invalid JSON Schema: {e}"),
            })?;

        let validator = Arc::new(validator);
        // Older compilations of the same file are stale now.
        self.compiled.retain(|(path, _), _| path != schema_path);
        self.compiled.insert(key, Arc::clone(&validator));
        debug!(schema = %schema_path.display(), "compiled JSON schema");
        Ok(validator)
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, json: &str, schema_path: &Path) -> Result<SchemaValidationResult> {
        let validator = self.compile(schema_path)?;
        let instance: Value = serde_json::from_str(json)?;
        let errors: Vec<String> = validator
            .iter_errors(&instance)
            .map(|err| err.to_string())
            .collect();
        Ok(SchemaValidationResult {
            is_valid: errors.is_empty(),
            errors,
        })
    }
}

/// Finds the schema that applies to `rule_set_path`.
///
/// Candidates, in order: `{stem}.schema{ext}`, `{stem}.schema.json`, then
/// [`SHARED_SCHEMA_NAMES`], all in the rule set's directory.
#[must_use]
pub fn discover_schema(rule_set_path: &Path) -> Option<PathBuf> {
    let dir = rule_set_path.parent().unwrap_or_else(|| Path::new("."));
    let stem = rule_set_path.file_stem()?.to_string_lossy();

    let mut candidates = Vec::with_capacity(4);
    if let Some(ext) = rule_set_path.extension() {
        candidates.push(dir.join(format!("{stem}.schema.{}", ext.to_string_lossy())));
    }
    candidates.push(dir.join(format!("{stem}.schema.json")));
    candidates.extend(SHARED_SCHEMA_NAMES.iter().map(|name| dir.join(name)));

    candidates.into_iter().find(|candidate| candidate.is_file())
}
