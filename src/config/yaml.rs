//! YAML rule sets and settings
//!
//! YAML documents are converted to the JSON model and then go through the
//! same pipeline as JSON documents.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::config::flatten::{FlattenedSettings, flatten_value, flatten_yaml_reader};
use crate::config::loader::{DocumentLoader, INLINE_SOURCE, LoaderCore, LoaderOptions};
use crate::config::schema::RuleSet;
use crate::error::{ConfigError, Result, SGuardError};
use crate::validators::ConfigValue;

/// Returns `true` for `.yaml` and `.yml` files (any case).
#[must_use]
pub fn is_yaml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// [`DocumentLoader`] for YAML documents.
#[derive(Debug, Clone)]
pub struct YamlLoader {
    core: LoaderCore,
}

impl YamlLoader {
    /// Creates a YAML loader with the given options.
    #[must_use]
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            core: LoaderCore::new(options),
        }
    }

    pub(crate) const fn from_core(core: LoaderCore) -> Self {
        Self { core }
    }
}

impl DocumentLoader for YamlLoader {
    fn load_rule_set(&self, path: &Path) -> Result<RuleSet> {
        load_rule_set(&self.core, path)
    }

    fn load_settings(&self, path: &Path) -> Result<FlattenedSettings> {
        load_settings(&self.core, path)
    }

    fn load_rule_set_from_str(&self, content: &str) -> Result<RuleSet> {
        let path = PathBuf::from(INLINE_SOURCE);
        let content = self.core.inline_text(content)?;
        rule_set_from_text(&self.core, &path, content)
    }
}

pub(crate) fn load_rule_set(core: &LoaderCore, path: &Path) -> Result<RuleSet> {
    let content = core.read_guarded(path)?;
    rule_set_from_text(core, path, &content)
}

pub(crate) fn load_settings(core: &LoaderCore, path: &Path) -> Result<FlattenedSettings> {
    let size = core.check_file(path)?;
    if core.should_stream(size) {
        let settings = core.stream_settings(path, size, |reader| {
            flatten_yaml_reader(reader).map_err(|e| parse_error(path, &e))
        })?;
        // A document holding only `~` or comments is empty, as in memory.
        if settings.len() == 1 && settings.get("") == Some(&ConfigValue::Null) {
            return Err(ConfigError::Empty {
                path: path.to_path_buf(),
            }
            .into());
        }
        return Ok(settings);
    }

    let content = core.read_guarded(path)?;
    let document = parse(path, &content)?;
    Ok(flatten_value(&yaml_to_json(&document)))
}

fn rule_set_from_text(core: &LoaderCore, path: &Path, content: &str) -> Result<RuleSet> {
    let document = yaml_to_json(&parse(path, content)?);
    let json_text = serde_json::to_string(&document)?;
    core.finish_rule_set(path, document, &json_text)
}

fn parse(path: &Path, content: &str) -> Result<Value> {
    let document: Value = serde_yaml::from_str(content).map_err(|e| parse_error(path, &e))?;
    if document.is_null() {
        return Err(ConfigError::Empty {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(document)
}

fn parse_error(path: &Path, e: &serde_yaml::Error) -> SGuardError {
    ConfigError::Parse {
        path: path.to_path_buf(),
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    }
    .into()
}

/// Converts a YAML value to the JSON model.
///
/// Scalar mapping keys are stringified; complex keys are dropped. Tags are
/// ignored.
fn yaml_to_json(yaml: &Value) -> serde_json::Value {
    match yaml {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                serde_json::Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map_or(serde_json::Value::Null, serde_json::Value::Number)
            } else {
                serde_json::Value::Null
            }
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Sequence(seq) => serde_json::Value::Array(seq.iter().map(yaml_to_json).collect()),
        Value::Mapping(map) => {
            let obj: serde_json::Map<String, serde_json::Value> = map
                .iter()
                .filter_map(|(k, v)| scalar_key(k).map(|key| (key, yaml_to_json(v))))
                .collect();
            serde_json::Value::Object(obj)
        }
        Value::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

fn scalar_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_key(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
