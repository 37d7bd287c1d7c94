//! Configuration for the mdpost publishing pipeline.
//!
//! Two layers live here:
//!
//! - [`ConfigStore`]: per-plugin configuration (enabled flag plus plugin-owned
//!   values) backed by the host's JSON settings blob, with copy-on-write
//!   snapshots for renders and a persistence callback for writes.
//! - [`HostConfig`]: the `mdpost.toml` file locating the settings blob,
//!   templates and assets for a host session.
//!
//! [`MetaConfig`] is the UI-agnostic schema each plugin publishes for its
//! editable keys.

mod expand;
mod host;
mod meta;
mod settings;
mod store;
mod value;

use std::path::PathBuf;

pub use host::{CliSettings, HostConfig, HostPaths, RenderConfig};
pub use meta::{FieldKind, MetaConfig, MetaField, SelectOption};
pub use settings::{DEFAULT_ACCENT, DEFAULT_HIGHLIGHT, DEFAULT_THEME, Settings};
pub use store::{ConfigStore, FileSettingsSink, SettingsSink};
pub use value::{ConfigMap, ConfigValue, ENABLED_KEY, PluginConfig};

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`paths.templates`").
        field: String,
        /// Error message (e.g., "${`VAULT_DIR`} not set").
        message: String,
    },
}
