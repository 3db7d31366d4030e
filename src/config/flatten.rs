//! Settings flattening
//!
//! Nested settings documents are reduced to a flat `key → value` map. Object
//! members become `parent:child` keys, arrays are kept whole under their
//! parent key, scalars keep their native kind. A root that is not an object
//! is stored under the empty key. When a key repeats, the last occurrence
//! wins.
//!
//! Two strategies produce identical maps:
//! - [`flatten_value`] walks an already parsed document;
//! - [`FlattenSeed`] flattens while the parser reads, so large files never
//!   exist as a full document tree in memory. Only arrays are materialized.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor,
};
use serde::Serialize;
use serde_json::Value;

use crate::validators::ConfigValue;

/// Separator between nested keys.
pub const KEY_SEPARATOR: char = ':';

/// Flat view of a settings document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlattenedSettings {
    entries: IndexMap<String, ConfigValue>,
}

impl FlattenedSettings {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `key`. Dotted keys (`Logging.Level`) are also tried in
    /// colon form (`Logging:Level`).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key).or_else(|| {
            key.contains('.')
                .then(|| key.replace('.', ":"))
                .and_then(|normalized| self.entries.get(&normalized))
        })
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, key: impl Into<String>, value: ConfigValue) {
        self.entries.insert(key.into(), value);
    }

    /// Removes `prefix` and every key nested under it.
    fn remove_subtree(&mut self, prefix: &str) {
        self.entries.retain(|key, _| {
            key != prefix
                && !key
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with(KEY_SEPARATOR))
        });
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over keys and values in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.entries.iter()
    }
}

impl FromIterator<(String, ConfigValue)> for FlattenedSettings {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn child_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{KEY_SEPARATOR}{key}")
    }
}

// ============================================================================
// In-Memory Flattening
// ============================================================================

/// Flattens a parsed document.
#[must_use]
pub fn flatten_value(root: &Value) -> FlattenedSettings {
    let mut settings = FlattenedSettings::new();
    flatten_into(root, "", &mut settings);
    settings
}

fn flatten_into(value: &Value, prefix: &str, out: &mut FlattenedSettings) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(child, &child_key(prefix, key), out);
            }
        }
        other => out.insert(prefix, ConfigValue::from_json(other)),
    }
}

// ============================================================================
// Streaming Flattening
// ============================================================================

/// Flattens a document while it is being deserialized.
///
/// Works with any self-describing `serde` deserializer (JSON and YAML).
pub struct FlattenSeed<'a> {
    prefix: String,
    out: &'a mut FlattenedSettings,
}

impl<'a> FlattenSeed<'a> {
    /// Creates a seed writing root-level keys into `out`.
    pub fn new(out: &'a mut FlattenedSettings) -> Self {
        Self {
            prefix: String::new(),
            out,
        }
    }
}

impl<'de> DeserializeSeed<'de> for FlattenSeed<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for FlattenSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a settings document")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<(), E> {
        self.out.insert(self.prefix, ConfigValue::Bool(v));
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<(), E> {
        self.out.insert(self.prefix, ConfigValue::Number(v.into()));
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<(), E> {
        self.out.insert(self.prefix, ConfigValue::Number(v.into()));
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<(), E> {
        let value = serde_json::Number::from_f64(v)
            .map_or_else(|| ConfigValue::Unknown(v.to_string()), ConfigValue::Number);
        self.out.insert(self.prefix, value);
        Ok(())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<(), E> {
        self.out.insert(self.prefix, ConfigValue::String(v.to_string()));
        Ok(())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<(), E> {
        self.out.insert(self.prefix, ConfigValue::String(v));
        Ok(())
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<(), E> {
        self.out.insert(
            self.prefix,
            ConfigValue::Unknown(String::from_utf8_lossy(v).into_owned()),
        );
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        self.out.insert(self.prefix, ConfigValue::Null);
        Ok(())
    }

    fn visit_none<E: de::Error>(self) -> Result<(), E> {
        self.visit_unit()
    }

    fn visit_some<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        self.out.insert(self.prefix, ConfigValue::Raw(Value::Array(items)));
        Ok(())
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let out = self.out;
        let mut seen = HashSet::new();
        while let Some(FlatKey(key)) = map.next_key()? {
            let prefix = child_key(&self.prefix, &key);
            // Last occurrence of a repeated key wins.
            if !seen.insert(key) {
                out.remove_subtree(&prefix);
            }
            map.next_value_seed(FlattenSeed {
                prefix,
                out: &mut *out,
            })?;
        }
        Ok(())
    }

    // YAML tags (`!secret value`) are dropped and the tagged value is kept.
    fn visit_enum<A>(self, data: A) -> Result<(), A::Error>
    where
        A: EnumAccess<'de>,
    {
        let (_tag, variant): (FlatKey, _) = data.variant()?;
        variant.newtype_variant_seed(self)
    }
}

/// A mapping key rendered as text. YAML allows scalar keys of any kind.
struct FlatKey(String);

impl<'de> de::Deserialize<'de> for FlatKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = FlatKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a scalar mapping key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FlatKey, E> {
                Ok(FlatKey(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<FlatKey, E> {
                Ok(FlatKey(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<FlatKey, E> {
                Ok(FlatKey(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<FlatKey, E> {
                Ok(FlatKey(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<FlatKey, E> {
                Ok(FlatKey(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<FlatKey, E> {
                Ok(FlatKey(v.to_string()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

/// Streams a JSON document from `reader` into a flat map.
///
/// # Errors
///
/// Returns the parser error for malformed input or trailing content.
pub fn flatten_json_reader<R: std::io::Read>(
    reader: R,
) -> Result<FlattenedSettings, serde_json::Error> {
    let mut settings = FlattenedSettings::new();
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    FlattenSeed::new(&mut settings).deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(settings)
}

/// Streams a YAML document from `reader` into a flat map.
///
/// # Errors
///
/// Returns the parser error for malformed input.
pub fn flatten_yaml_reader<R: std::io::Read>(
    reader: R,
) -> Result<FlattenedSettings, serde_yaml::Error> {
    let mut settings = FlattenedSettings::new();
    FlattenSeed::new(&mut settings).deserialize(serde_yaml::Deserializer::from_reader(reader))?;
    Ok(settings)
}
