//! Plugin configuration values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key under which the enabled flag lives inside a plugin's config object.
pub const ENABLED_KEY: &str = "enabled";

/// A single plugin-owned configuration value.
///
/// Mirrors the settings blob, where values are JSON strings, booleans or numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl ConfigValue {
    /// Returns the boolean value, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the numeric value as `f64`, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => value.as_f64(),
            _ => None,
        }
    }

    /// Returns the numeric value as `u64`, if this is a non-negative integer.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(value) => value.as_u64(),
            _ => None,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Partial or full set of plugin config values keyed by name.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// Configuration of one plugin: the enabled flag plus plugin-owned values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Whether the plugin participates in rendering.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Plugin-owned key/value settings.
    #[serde(flatten)]
    pub values: ConfigMap,
}

fn default_enabled() -> bool {
    true
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            values: ConfigMap::new(),
        }
    }
}

impl PluginConfig {
    /// Look up a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Boolean value for `key`, or `default` when missing or not a boolean.
    #[must_use]
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(ConfigValue::as_bool).unwrap_or(default)
    }

    /// String value for `key`, or `default` when missing or not a string.
    #[must_use]
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(ConfigValue::as_str).unwrap_or(default)
    }

    /// Shallow-merge `partial` into this config.
    ///
    /// An `enabled` key updates the flag; every other key replaces the stored
    /// value of the same name. Keys absent from `partial` are kept.
    pub fn merge(&mut self, partial: &ConfigMap) {
        for (key, value) in partial {
            if key == ENABLED_KEY {
                match value.as_bool() {
                    Some(enabled) => self.enabled = enabled,
                    None => tracing::warn!(value = ?value, "ignoring non-boolean enabled flag"),
                }
            } else {
                self.values.insert(key.clone(), value.clone());
            }
        }
    }

    /// Insert every key of `defaults` that is not already present.
    ///
    /// Returns `true` when at least one key was added.
    pub fn fill_defaults(&mut self, defaults: &ConfigMap) -> bool {
        let mut changed = false;
        for (key, value) in defaults {
            if key == ENABLED_KEY {
                continue;
            }
            if !self.values.contains_key(key) {
                self.values.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }
}
