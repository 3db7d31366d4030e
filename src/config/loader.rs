//! Rule set and settings loading
//!
//! Every file goes through the same guards before it is parsed:
//! 1. Existence and regular-file check
//! 2. Size limit (exact size and limit reported)
//! 3. Bounded read (UTF-8 BOM stripped, blank content rejected)
//!
//! Rule sets are then checked against an auto-discovered JSON Schema,
//! deserialized, bounded by count limits and validated structurally.
//! Settings are flattened, streaming from disk when the file is large.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::flatten::{FlattenedSettings, flatten_json_reader, flatten_value};
use crate::config::schema::RuleSet;
use crate::config::schema_check::{JsonSchemaValidator, SchemaValidator, discover_schema};
use crate::config::structure::ConfigStructureValidator;
use crate::config::yaml::{self, YamlLoader};
use crate::error::{ConfigError, Result, SGuardError};
use crate::validators::ValidatorRegistry;

/// Pseudo-path used in errors for rule sets parsed from a string.
pub const INLINE_SOURCE: &str = "<inline>";

// ============================================================================
// Options
// ============================================================================

/// Limits guarding against oversized or adversarial inputs.
///
/// Every default can be overridden through an `SGUARD_*` environment
/// variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityLimits {
    /// Maximum size of any rule set or settings file.
    pub max_file_size_bytes: u64,

    /// Maximum number of environments in a rule set.
    pub max_environments_count: usize,

    /// Maximum number of rules in a rule set.
    pub max_rules_count: usize,

    /// Maximum number of conditions in one rule.
    pub max_conditions_per_rule: usize,

    /// Maximum number of validators in one condition.
    pub max_validators_per_condition: usize,

    /// Capacity of the path resolution cache.
    pub max_path_cache_size: usize,

    /// Cache fill level, in percent of capacity, that triggers eviction.
    pub path_cache_eviction_threshold_percent: usize,

    /// Maximum length of an environment settings path.
    pub max_path_length: usize,

    /// Settings files larger than this are flattened while streaming.
    pub streaming_threshold_bytes: u64,
}

impl Default for SecurityLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: env_or("SGUARD_MAX_FILE_SIZE", 10 * 1024 * 1024),
            max_environments_count: env_or("SGUARD_MAX_ENVIRONMENTS", 100),
            max_rules_count: env_or("SGUARD_MAX_RULES", 1000),
            max_conditions_per_rule: env_or("SGUARD_MAX_CONDITIONS_PER_RULE", 100),
            max_validators_per_condition: env_or("SGUARD_MAX_VALIDATORS_PER_CONDITION", 50),
            max_path_cache_size: env_or("SGUARD_MAX_PATH_CACHE_SIZE", 1000),
            path_cache_eviction_threshold_percent: env_or("SGUARD_PATH_CACHE_EVICTION_PERCENT", 100),
            max_path_length: env_or("SGUARD_MAX_PATH_LENGTH", 1024),
            streaming_threshold_bytes: env_or("SGUARD_STREAMING_THRESHOLD", 1024 * 1024),
        }
    }
}

/// Options for [`ConfigLoader`] and [`YamlLoader`].
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Size and count limits.
    pub limits: SecurityLimits,

    /// Apply an auto-discovered JSON Schema to rule sets.
    pub validate_schema: bool,

    /// Run [`ConfigStructureValidator`] on rule sets.
    pub validate_structure: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            limits: SecurityLimits::default(),
            validate_schema: true,
            validate_structure: true,
        }
    }
}

// ============================================================================
// Loader Trait
// ============================================================================

/// Loads rule sets and settings documents.
pub trait DocumentLoader: Send + Sync + std::fmt::Debug {
    /// Loads and validates a rule set file.
    ///
    /// # Errors
    ///
    /// Returns [`SGuardError::FileNotFound`] if the file is absent, and
    /// [`SGuardError::Config`] for empty, oversized, malformed, schema-invalid
    /// or structurally invalid content.
    fn load_rule_set(&self, path: &Path) -> Result<RuleSet>;

    /// Loads a settings file and flattens it.
    ///
    /// # Errors
    ///
    /// Returns [`SGuardError::FileNotFound`] if the file is absent, and
    /// [`SGuardError::Config`] for empty, oversized or malformed content.
    fn load_settings(&self, path: &Path) -> Result<FlattenedSettings>;

    /// Parses and validates a rule set held in memory.
    ///
    /// # Errors
    ///
    /// Same as [`DocumentLoader::load_rule_set`], minus file access errors.
    fn load_rule_set_from_str(&self, content: &str) -> Result<RuleSet>;
}

// ============================================================================
// Shared Pipeline
// ============================================================================

/// Guards and validation steps shared by the JSON and YAML loaders.
#[derive(Debug, Clone)]
pub(crate) struct LoaderCore {
    pub(crate) options: LoaderOptions,
    known_validators: BTreeSet<String>,
    schema_validator: Arc<dyn SchemaValidator>,
}

impl LoaderCore {
    pub(crate) fn new(options: LoaderOptions) -> Self {
        let schema_validator =
            JsonSchemaValidator::with_max_file_size(options.limits.max_file_size_bytes);
        Self {
            options,
            known_validators: ValidatorRegistry::builtin().known_names(),
            schema_validator: Arc::new(schema_validator),
        }
    }

    /// Checks existence and size, returning the file length.
    pub(crate) fn check_file(&self, path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path).map_err(|e| SGuardError::io(path, e))?;
        if !metadata.is_file() {
            return Err(SGuardError::invalid_argument(
                "path",
                format!("{} is not a regular file", path.display()),
            ));
        }

        let size = metadata.len();
        let limit = self.options.limits.max_file_size_bytes;
        if size > limit {
            return Err(ConfigError::FileTooLarge {
                path: path.to_path_buf(),
                size,
                limit,
            }
            .into());
        }
        Ok(size)
    }

    /// Reads a whole file as text after the existence and size guards.
    pub(crate) fn read_guarded(&self, path: &Path) -> Result<String> {
        let size = self.check_file(path)?;

        let mut content = String::new();
        let capacity = usize::try_from(size).unwrap_or(usize::MAX);
        content
            .try_reserve_exact(capacity)
            .map_err(|e| SGuardError::ResourceExhausted {
                context: format!("reading {}", path.display()),
                message: e.to_string(),
            })?;

        let mut file = File::open(path).map_err(|e| SGuardError::io(path, e))?;
        file.read_to_string(&mut content).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                ConfigError::Parse {
                    path: path.to_path_buf(),
                    line: None,
                    message: "file is not valid UTF-8".to_string(),
                }
                .into()
            } else {
                SGuardError::io(path, e)
            }
        })?;

        // Handle UTF-8 BOM
        if let Some(stripped) = content.strip_prefix('\u{feff}') {
            content = stripped.to_string();
        }
        if content.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: path.to_path_buf(),
            }
            .into());
        }
        Ok(content)
    }

    /// Applies the size guard, BOM strip and blank check to rule set text
    /// held in memory.
    pub(crate) fn inline_text<'a>(&self, content: &'a str) -> Result<&'a str> {
        let path = PathBuf::from(INLINE_SOURCE);
        let size = content.len() as u64;
        let limit = self.options.limits.max_file_size_bytes;
        if size > limit {
            return Err(ConfigError::FileTooLarge { path, size, limit }.into());
        }

        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        if content.trim().is_empty() {
            return Err(ConfigError::Empty { path }.into());
        }
        Ok(content)
    }

    /// Opens a settings file for streaming and runs `flatten` over it.
    ///
    /// A leading UTF-8 BOM is skipped. A file holding nothing but whitespace
    /// fails with [`ConfigError::Empty`], as it does when read in memory.
    pub(crate) fn stream_settings<F>(
        &self,
        path: &Path,
        size: u64,
        flatten: F,
    ) -> Result<FlattenedSettings>
    where
        F: FnOnce(&mut dyn Read) -> Result<FlattenedSettings>,
    {
        debug!(path = %path.display(), size, "streaming settings file");
        let file = File::open(path).map_err(|e| SGuardError::io(path, e))?;
        let mut reader = BufReader::new(file);
        skip_bom(&mut reader).map_err(|e| SGuardError::io(path, e))?;

        let mut tracked = ContentTracker::new(reader);
        let outcome = flatten(&mut tracked);
        if !tracked.has_content {
            return Err(ConfigError::Empty {
                path: path.to_path_buf(),
            }
            .into());
        }
        outcome
    }

    /// Schema check, deserialization, count limits and structure check.
    ///
    /// `json_text` is the document as JSON, handed to the schema validator.
    /// Schema discovery runs only for documents backed by a file.
    pub(crate) fn finish_rule_set(
        &self,
        path: &Path,
        document: Value,
        json_text: &str,
    ) -> Result<RuleSet> {
        let from_file = path != Path::new(INLINE_SOURCE);
        if self.options.validate_schema && from_file {
            if let Some(schema) = discover_schema(path) {
                debug!(schema = %schema.display(), "applying JSON schema");
                let outcome = self.schema_validator.validate(json_text, &schema)?;
                if !outcome.is_valid {
                    return Err(ConfigError::SchemaMismatch {
                        path: path.to_path_buf(),
                        schema,
                        errors: outcome.errors,
                    }
                    .into());
                }
            }
        }

        let rule_set: RuleSet =
            serde_json::from_value(document).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                line: None,
                message: format!("failed to deserialize rule set: {e}"),
            })?;

        let limits = &self.options.limits;
        if rule_set.environments.is_empty() {
            return Err(ConfigError::NoEnvironments {
                path: path.to_path_buf(),
            }
            .into());
        }
        check_count("environments", rule_set.environments.len(), limits.max_environments_count)?;
        check_count("rules", rule_set.rules.len(), limits.max_rules_count)?;

        if self.options.validate_structure {
            let errors =
                ConfigStructureValidator::new(limits).validate(&rule_set, &self.known_validators);
            if !errors.is_empty() {
                return Err(ConfigError::StructureInvalid {
                    path: path.to_path_buf(),
                    errors,
                }
                .into());
            }
        }

        info!(
            path = %path.display(),
            environments = rule_set.environments.len(),
            rules = rule_set.rules.len(),
            "loaded rule set"
        );
        Ok(rule_set)
    }

    /// Returns `true` when a file of `size` bytes should be streamed.
    pub(crate) const fn should_stream(&self, size: u64) -> bool {
        size > self.options.limits.streaming_threshold_bytes
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn skip_bom<R: BufRead>(reader: &mut R) -> std::io::Result<()> {
    if reader.fill_buf()?.starts_with(UTF8_BOM) {
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}

/// Records whether anything other than whitespace was read.
struct ContentTracker<R> {
    inner: R,
    has_content: bool,
}

impl<R> ContentTracker<R> {
    const fn new(inner: R) -> Self {
        Self {
            inner,
            has_content: false,
        }
    }
}

impl<R: Read> Read for ContentTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if !self.has_content {
            self.has_content = buf[..n].iter().any(|b| !b.is_ascii_whitespace());
        }
        Ok(n)
    }
}

fn check_count(what: &str, count: usize, limit: usize) -> Result<()> {
    if count > limit {
        return Err(ConfigError::LimitExceeded {
            what: what.to_string(),
            count,
            limit,
        }
        .into());
    }
    Ok(())
}

pub(crate) fn json_parse_error(path: &Path, e: &serde_json::Error) -> SGuardError {
    ConfigError::Parse {
        path: path.to_path_buf(),
        line: (e.line() > 0).then(|| e.line()),
        message: e.to_string(),
    }
    .into()
}

// ============================================================================
// ConfigLoader
// ============================================================================

/// Default [`DocumentLoader`]: JSON, with `.yaml`/`.yml` files handed to
/// [`YamlLoader`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    core: LoaderCore,
}

impl ConfigLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            core: LoaderCore::new(options),
        }
    }

    /// Creates a loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Replaces the validator names accepted by the structure check.
    #[must_use]
    pub fn with_known_validators(mut self, names: BTreeSet<String>) -> Self {
        self.core.known_validators = names;
        self
    }

    /// Replaces the schema collaborator.
    #[must_use]
    pub fn with_schema_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.core.schema_validator = validator;
        self
    }

    /// Loader options in effect.
    #[must_use]
    pub const fn options(&self) -> &LoaderOptions {
        &self.core.options
    }

    /// YAML loader sharing this loader's configuration.
    #[must_use]
    pub fn yaml(&self) -> YamlLoader {
        YamlLoader::from_core(self.core.clone())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DocumentLoader for ConfigLoader {
    fn load_rule_set(&self, path: &Path) -> Result<RuleSet> {
        if yaml::is_yaml_path(path) {
            return yaml::load_rule_set(&self.core, path);
        }
        let content = self.core.read_guarded(path)?;
        let document: Value =
            serde_json::from_str(&content).map_err(|e| json_parse_error(path, &e))?;
        self.core.finish_rule_set(path, document, &content)
    }

    fn load_settings(&self, path: &Path) -> Result<FlattenedSettings> {
        if yaml::is_yaml_path(path) {
            return yaml::load_settings(&self.core, path);
        }
        let size = self.core.check_file(path)?;
        if self.core.should_stream(size) {
            return self.core.stream_settings(path, size, |reader| {
                flatten_json_reader(reader).map_err(|e| {
                    if e.is_io() {
                        SGuardError::io(path, e.into())
                    } else {
                        json_parse_error(path, &e)
                    }
                })
            });
        }

        let content = self.core.read_guarded(path)?;
        let document: Value =
            serde_json::from_str(&content).map_err(|e| json_parse_error(path, &e))?;
        Ok(flatten_value(&document))
    }

    fn load_rule_set_from_str(&self, content: &str) -> Result<RuleSet> {
        let path = PathBuf::from(INLINE_SOURCE);
        let content = self.core.inline_text(content)?;
        let document: Value =
            serde_json::from_str(content).map_err(|e| json_parse_error(&path, &e))?;
        self.core.finish_rule_set(&path, document, content)
    }
}

/// Returns the value of environment variable `name` parsed as `T`, or
/// `default` when it is unset or unparsable.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema_check::SchemaValidationResult;
    use crate::validators::ConfigValue;

    const RULES: &str = r#"{
        "version": "1",
        "environments": [{"id": "dev", "name": "Development", "path": "dev.json"}],
        "rules": [{
            "id": "r1",
            "environments": ["dev"],
            "rule": {"id": "r1", "conditions": [{
                "key": "Logging:Level",
                "condition": [{"validator": "required", "message": "missing"}]
            }]}
        }]
    }"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn limits() -> SecurityLimits {
        SecurityLimits {
            max_file_size_bytes: 10 * 1024 * 1024,
            max_environments_count: 100,
            max_rules_count: 1000,
            max_conditions_per_rule: 100,
            max_validators_per_condition: 50,
            max_path_cache_size: 1000,
            path_cache_eviction_threshold_percent: 100,
            max_path_length: 1024,
            streaming_threshold_bytes: 1024 * 1024,
        }
    }

    fn loader_with(limits: SecurityLimits) -> ConfigLoader {
        ConfigLoader::new(LoaderOptions {
            limits,
            ..LoaderOptions::default()
        })
    }

    #[test]
    fn test_load_rule_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "rules.json", RULES);
        let rule_set = loader_with(limits()).load_rule_set(&path).unwrap();
        assert_eq!(rule_set.version, "1");
        assert_eq!(rule_set.environment_ids(), vec!["dev"]);
        assert_eq!(rule_set.rules.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::default()
            .load_rule_set(&dir.path().join("absent.json"))
            .unwrap_err();
        assert!(matches!(err, SGuardError::FileNotFound { .. }));
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "rules.json", &format!("\u{feff}{RULES}"));
        assert!(loader_with(limits()).load_rule_set(&path).is_ok());
    }

    #[test]
    fn test_blank_file_is_empty_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "rules.json", "  \n\t ");
        let err = loader_with(limits()).load_rule_set(&path).unwrap_err();
        assert!(matches!(err, SGuardError::Config(ConfigError::Empty { .. })));
    }

    #[test]
    fn test_oversized_file_reports_size_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "rules.json", RULES);
        let size = fs::metadata(&path).unwrap().len();
        let err = loader_with(SecurityLimits {
            max_file_size_bytes: 16,
            ..limits()
        })
        .load_rule_set(&path)
        .unwrap_err();
        match err {
            SGuardError::Config(ConfigError::FileTooLarge { size: s, limit, .. }) => {
                assert_eq!(s, size);
                assert_eq!(limit, 16);
            }
            other => panic!("expected FileTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "rules.json", "{\n  \"version\": \n}");
        let err = loader_with(limits()).load_rule_set(&path).unwrap_err();
        match err {
            SGuardError::Config(ConfigError::Parse { line, .. }) => assert_eq!(line, Some(3)),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_no_environments() {
        let loader = loader_with(limits());
        let err = loader
            .load_rule_set_from_str(r#"{"version": "1", "environments": [], "rules": []}"#)
            .unwrap_err();
        assert!(matches!(err, SGuardError::Config(ConfigError::NoEnvironments { .. })));
    }

    #[test]
    fn test_environment_limit() {
        let loader = loader_with(SecurityLimits {
            max_environments_count: 0,
            ..limits()
        });
        let err = loader.load_rule_set_from_str(RULES).unwrap_err();
        assert!(err.to_string().contains("1 environments"));
        assert!(err.to_string().contains("maximum of 0"));
    }

    #[test]
    fn test_rule_limit() {
        let loader = loader_with(SecurityLimits {
            max_rules_count: 0,
            ..limits()
        });
        let err = loader.load_rule_set_from_str(RULES).unwrap_err();
        assert!(matches!(
            err,
            SGuardError::Config(ConfigError::LimitExceeded { count: 1, limit: 0, .. })
        ));
    }

    #[test]
    fn test_structure_errors_are_collected() {
        let loader = loader_with(limits());
        let err = loader
            .load_rule_set_from_str(
                r#"{"environments": [{"id": "dev", "name": "", "path": "dev.json"}], "rules": []}"#,
            )
            .unwrap_err();
        match err {
            SGuardError::Config(ConfigError::StructureInvalid { errors, .. }) => {
                assert!(errors.len() >= 3, "{errors:?}");
            }
            other => panic!("expected StructureInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_structure_check_can_be_disabled() {
        let loader = ConfigLoader::new(LoaderOptions {
            limits: limits(),
            validate_schema: true,
            validate_structure: false,
        });
        let rule_set = loader
            .load_rule_set_from_str(
                r#"{"environments": [{"id": "dev", "name": "", "path": "dev.json"}]}"#,
            )
            .unwrap();
        assert!(rule_set.rules.is_empty());
    }

    #[test]
    fn test_discovered_schema_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "rules.json", RULES);
        write(
            dir.path(),
            "rules.schema.json",
            r#"{"type": "object", "properties": {"version": {"type": "integer"}}}"#,
        );
        let err = loader_with(limits()).load_rule_set(&path).unwrap_err();
        assert!(matches!(err, SGuardError::Config(ConfigError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_custom_schema_validator() {
        #[derive(Debug)]
        struct RejectAll;

        impl SchemaValidator for RejectAll {
            fn validate(&self, _json: &str, _schema: &Path) -> Result<SchemaValidationResult> {
                Ok(SchemaValidationResult {
                    is_valid: false,
                    errors: vec!["first".into(), "second".into()],
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "rules.json", RULES);
        write(dir.path(), "sguard.schema.json", "{}");
        let err = loader_with(limits())
            .with_schema_validator(Arc::new(RejectAll))
            .load_rule_set(&path)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("first; second"), "{message}");
    }

    #[test]
    fn test_load_settings_in_memory_and_streaming_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "appsettings.json",
            r#"{"Logging": {"Level": "Warning"}, "Hosts": ["a", "b"], "Port": 8080}"#,
        );

        let in_memory = loader_with(limits()).load_settings(&path).unwrap();
        let streamed = loader_with(SecurityLimits {
            streaming_threshold_bytes: 0,
            ..limits()
        })
        .load_settings(&path)
        .unwrap();

        assert_eq!(in_memory, streamed);
        assert_eq!(in_memory.get("Logging.Level"), Some(&ConfigValue::from("Warning")));
        assert_eq!(in_memory.len(), 3);
    }

    #[test]
    fn test_streaming_strips_bom_like_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "appsettings.json", "\u{feff}{\"a\": {\"b\": 1}}");

        let in_memory = loader_with(limits()).load_settings(&path).unwrap();
        let streamed = loader_with(SecurityLimits {
            streaming_threshold_bytes: 0,
            ..limits()
        })
        .load_settings(&path)
        .unwrap();

        assert_eq!(in_memory, streamed);
        assert_eq!(streamed.len(), 1);
        assert!(streamed.get("a:b").is_some());
    }

    #[test]
    fn test_streaming_blank_file_is_empty_error() {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in [("blank.json", " \n\t\n"), ("bom.json", "\u{feff}  \n")] {
            let path = write(dir.path(), name, content);
            let err = loader_with(SecurityLimits {
                streaming_threshold_bytes: 0,
                ..limits()
            })
            .load_settings(&path)
            .unwrap_err();
            assert!(
                matches!(err, SGuardError::Config(ConfigError::Empty { .. })),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn test_flattened_keys_keep_document_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "appsettings.json", r#"{"z": 1, "m": {"y": 2, "b": 3}, "a": 4}"#);

        let in_memory = loader_with(limits()).load_settings(&path).unwrap();
        let streamed = loader_with(SecurityLimits {
            streaming_threshold_bytes: 0,
            ..limits()
        })
        .load_settings(&path)
        .unwrap();

        let expected = ["z", "m:y", "m:b", "a"];
        assert_eq!(in_memory.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), expected);
        assert_eq!(streamed.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_inline_rule_set_is_size_limited() {
        let loader = loader_with(SecurityLimits {
            max_file_size_bytes: 16,
            ..limits()
        });
        let err = loader.load_rule_set_from_str(RULES).unwrap_err();
        match err {
            SGuardError::Config(ConfigError::FileTooLarge { path, size, limit }) => {
                assert_eq!(path, PathBuf::from(INLINE_SOURCE));
                assert_eq!(size, RULES.len() as u64);
                assert_eq!(limit, 16);
            }
            other => panic!("expected FileTooLarge, got {other}"),
        }

        let err = loader.yaml().load_rule_set_from_str("version: '1'\nenvironments: []\n").unwrap_err();
        assert!(matches!(err, SGuardError::Config(ConfigError::FileTooLarge { .. })));
    }

    #[test]
    fn test_streaming_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "appsettings.json", r#"{"a": 1,"#);
        let err = loader_with(SecurityLimits {
            streaming_threshold_bytes: 0,
            ..limits()
        })
        .load_settings(&path)
        .unwrap_err();
        assert!(matches!(err, SGuardError::Config(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_empty_object_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "appsettings.json", "{}");
        assert!(loader_with(limits()).load_settings(&path).unwrap().is_empty());
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader_with(limits()).load_settings(dir.path()).unwrap_err();
        assert!(matches!(err, SGuardError::InvalidArgument { .. }));
    }
}
