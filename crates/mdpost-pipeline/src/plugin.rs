//! Plugin capability contracts.

use async_trait::async_trait;
use mdpost_config::{ConfigMap, MetaConfig, PluginConfig, Settings};
use mdpost_renderer::{RuleError, TokenRule};
use serde::Serialize;

/// Which orchestrator drives a plugin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Shapes token rendering inside the parser.
    ParseTime,
    /// Transforms the complete rendered HTML.
    PostRender,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseTime => f.write_str("parse-time"),
            Self::PostRender => f.write_str("post-render"),
        }
    }
}

/// Failure inside a plugin hook or transform.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A config value has the wrong shape.
    #[error("invalid config value for '{key}': {message}")]
    Config { key: String, message: String },
    /// An asset lookup failed.
    #[error("asset error: {0}")]
    Asset(String),
    /// The transform could not process its input.
    #[error("{0}")]
    Transform(String),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// What a parse-time hook sees: the render's settings snapshot and the
/// plugin's own config taken from it.
#[derive(Clone, Copy, Debug)]
pub struct HookContext<'a> {
    pub settings: &'a Settings,
    pub config: &'a PluginConfig,
}

/// A plugin that contributes a token rule to the parse engine.
///
/// Lifecycle per render: `prepare`, `preprocess`, token rule calls during
/// parsing, then `postprocess`. A plugin not attached to the engine gets none
/// of these calls.
#[async_trait]
pub trait ParseTimePlugin: TokenRule + Send {
    /// Schema of the user-editable config keys.
    fn meta_config(&self) -> MetaConfig {
        MetaConfig::new()
    }

    /// Values seeded into the config store at registration.
    fn default_config(&self) -> ConfigMap {
        ConfigMap::new()
    }

    /// Reset per-render state and read config. Runs before parsing.
    async fn prepare(&mut self, ctx: &HookContext<'_>) -> Result<(), PluginError> {
        let _ = ctx;
        Ok(())
    }

    /// Rewrite the Markdown source before it reaches the engine.
    async fn preprocess(&mut self, source: &str, ctx: &HookContext<'_>) -> Result<String, PluginError> {
        let _ = ctx;
        Ok(source.to_owned())
    }

    /// Final pass over the parsed HTML, after every token rule fired.
    async fn postprocess(&mut self, html: &str, ctx: &HookContext<'_>) -> Result<String, PluginError> {
        let _ = ctx;
        Ok(html.to_owned())
    }
}

/// What a post-render transform sees.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext<'a> {
    pub settings: &'a Settings,
    pub config: &'a PluginConfig,
}

/// A pure transform over the complete rendered HTML.
pub trait PostRenderPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn meta_config(&self) -> MetaConfig {
        MetaConfig::new()
    }

    fn default_config(&self) -> ConfigMap {
        ConfigMap::new()
    }

    fn process(&self, html: &str, ctx: &ProcessContext<'_>) -> Result<String, PluginError>;
}

/// A registered plugin, tagged by capability.
pub enum PluginKind {
    ParseTime(Box<dyn ParseTimePlugin>),
    PostRender(Box<dyn PostRenderPlugin>),
}

impl PluginKind {
    #[must_use]
    pub fn parse_time(plugin: impl ParseTimePlugin + 'static) -> Self {
        Self::ParseTime(Box::new(plugin))
    }

    #[must_use]
    pub fn post_render(plugin: impl PostRenderPlugin + 'static) -> Self {
        Self::PostRender(Box::new(plugin))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::ParseTime(plugin) => plugin.name(),
            Self::PostRender(plugin) => plugin.name(),
        }
    }

    #[must_use]
    pub fn capability(&self) -> Capability {
        match self {
            Self::ParseTime(_) => Capability::ParseTime,
            Self::PostRender(_) => Capability::PostRender,
        }
    }

    #[must_use]
    pub fn meta_config(&self) -> MetaConfig {
        match self {
            Self::ParseTime(plugin) => plugin.meta_config(),
            Self::PostRender(plugin) => plugin.meta_config(),
        }
    }

    #[must_use]
    pub fn default_config(&self) -> ConfigMap {
        match self {
            Self::ParseTime(plugin) => plugin.default_config(),
            Self::PostRender(plugin) => plugin.default_config(),
        }
    }
}

impl std::fmt::Debug for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginKind")
            .field("name", &self.name())
            .field("capability", &self.capability())
            .finish()
    }
}

/// UI-facing projection of one registered plugin.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginData {
    pub name: String,
    pub capability: Capability,
    pub enabled: bool,
    pub config: ConfigMap,
    pub meta_config: MetaConfig,
}
