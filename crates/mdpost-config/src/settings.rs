//! Persisted settings blob.
//!
//! The host owns the blob; the pipeline reads and writes `pluginsConfig` and a
//! handful of global render fields. Unknown top-level keys are carried through
//! untouched so a save never drops host data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ConfigError;
use crate::value::PluginConfig;

/// Default theme name.
pub const DEFAULT_THEME: &str = "default";
/// Default code highlight style.
pub const DEFAULT_HIGHLIGHT: &str = "github";
/// Default accent color used when custom colors are enabled without a value.
pub const DEFAULT_ACCENT: &str = "#0f4c81";

/// Full settings blob.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Per-plugin configuration keyed by plugin name.
    pub plugins_config: BTreeMap<String, PluginConfig>,
    /// Active theme.
    pub theme: String,
    /// Code highlight style.
    pub highlight: String,
    /// Name of the template wrapping the article. Empty means no wrapping.
    pub template: String,
    /// Whether `custom_color` replaces the theme accent color.
    pub use_custom_color: bool,
    /// Custom accent color.
    pub custom_color: String,
    /// Host-owned keys the pipeline does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            plugins_config: BTreeMap::new(),
            theme: DEFAULT_THEME.to_owned(),
            highlight: DEFAULT_HIGHLIGHT.to_owned(),
            template: String::new(),
            use_custom_color: false,
            custom_color: DEFAULT_ACCENT.to_owned(),
            extra: Map::new(),
        }
    }
}

/// Settings as read from disk, before per-plugin validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    #[serde(default)]
    plugins_config: BTreeMap<String, Value>,
    theme: Option<String>,
    highlight: Option<String>,
    template: Option<String>,
    use_custom_color: Option<bool>,
    custom_color: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Settings {
    /// Parse a settings blob, recovering from malformed input.
    ///
    /// A blob that is not a valid settings object yields defaults. A single
    /// malformed plugin entry yields defaults for that plugin only. Both cases
    /// log a warning; this never fails.
    #[must_use]
    /// Whether `json` loads without falling back to defaults wholesale.
    pub(crate) fn is_loadable(json: &str) -> bool {
        json.trim().is_empty() || serde_json::from_str::<RawSettings>(json).is_ok()
    }

    pub fn from_json(json: &str) -> Self {
        if json.trim().is_empty() {
            return Self::default();
        }

        let raw: RawSettings = match serde_json::from_str(json) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "malformed settings blob, using defaults");
                return Self::default();
            }
        };

        let defaults = Self::default();
        let plugins_config = raw
            .plugins_config
            .into_iter()
            .map(|(name, value)| {
                let config = serde_json::from_value(value).unwrap_or_else(|e| {
                    tracing::warn!(plugin = %name, error = %e, "malformed plugin config, using defaults");
                    PluginConfig::default()
                });
                (name, config)
            })
            .collect();

        Self {
            plugins_config,
            theme: raw.theme.unwrap_or(defaults.theme),
            highlight: raw.highlight.unwrap_or(defaults.highlight),
            template: raw.template.unwrap_or(defaults.template),
            use_custom_color: raw.use_custom_color.unwrap_or(defaults.use_custom_color),
            custom_color: raw.custom_color.unwrap_or(defaults.custom_color),
            extra: raw.extra,
        }
    }

    /// Serialize to pretty JSON for persistence.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Config of `plugin`, or the default (enabled, no values) if never configured.
    #[must_use]
    pub fn plugin_config(&self, plugin: &str) -> PluginConfig {
        self.plugins_config.get(plugin).cloned().unwrap_or_default()
    }

    /// Whether `plugin` is enabled. Unconfigured plugins are enabled.
    #[must_use]
    pub fn is_enabled(&self, plugin: &str) -> bool {
        self.plugins_config.get(plugin).is_none_or(|c| c.enabled)
    }

    /// Accent color to use, if the custom color toggle is on.
    #[must_use]
    pub fn accent_override(&self) -> Option<&str> {
        (self.use_custom_color && !self.custom_color.is_empty()).then_some(self.custom_color.as_str())
    }
}
