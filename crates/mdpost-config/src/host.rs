//! Host configuration file (`mdpost.toml`).
//!
//! Locates the settings blob, template directory and asset directory for a
//! host session. The file is auto-discovered in the current directory and its
//! parents; CLI settings override file values.
//!
//! Path values support `${VAR}` and `${VAR:-default}` expansion and are
//! resolved relative to the directory holding the config file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ConfigError;
use crate::expand;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdpost.toml";

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the settings blob path.
    pub settings_path: Option<PathBuf>,
    /// Override the template directory.
    pub templates_dir: Option<PathBuf>,
    /// Override the asset directory.
    pub assets_dir: Option<PathBuf>,
    /// Override the template applied to rendered articles.
    pub template: Option<String>,
}

/// Host configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct HostConfig {
    paths: PathsRaw,
    /// Render options.
    pub render: RenderConfig,

    /// Resolved paths (set after loading).
    #[serde(skip)]
    pub paths_resolved: HostPaths,
    /// Path to the config file, if one was loaded.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PathsRaw {
    settings: Option<String>,
    templates: Option<String>,
    assets: Option<String>,
}

/// Resolved host paths.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HostPaths {
    /// Settings blob (JSON).
    pub settings: PathBuf,
    /// Directory of named templates.
    pub templates: PathBuf,
    /// Directory searched for embedded images.
    pub assets: PathBuf,
}

/// Render options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Template name overriding the one stored in the settings blob.
    pub template: Option<String>,
    /// Enable GitHub Flavored Markdown extensions.
    pub gfm: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            template: None,
            gfm: true,
        }
    }
}

impl HostConfig {
    /// Load configuration from `config_path`, or discover `mdpost.toml`.
    ///
    /// Without a file, defaults relative to the current directory are used.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            let cwd = std::env::current_dir().unwrap_or_default();
            Self::default_with_base(&cwd)
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(path) = &settings.settings_path {
            self.paths_resolved.settings.clone_from(path);
        }
        if let Some(dir) = &settings.templates_dir {
            self.paths_resolved.templates.clone_from(dir);
        }
        if let Some(dir) = &settings.assets_dir {
            self.paths_resolved.assets.clone_from(dir);
        }
        if let Some(template) = &settings.template {
            self.render.template = Some(template.clone());
        }
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_base(base: &Path) -> Self {
        let mut config = Self::default();
        config.paths_resolved = Self::resolve(base, &PathsRaw::default());
        config
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.paths_resolved = Self::resolve(config_dir, &config.paths);
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let paths = &mut self.paths;
        for (value, field) in [
            (&mut paths.settings, "paths.settings"),
            (&mut paths.templates, "paths.templates"),
            (&mut paths.assets, "paths.assets"),
        ] {
            if let Some(raw) = value.take() {
                *value = Some(expand::expand_env(&raw, field)?);
            }
        }
        Ok(())
    }

    fn resolve(base: &Path, raw: &PathsRaw) -> HostPaths {
        let resolve = |path: Option<&str>, default: &str| base.join(path.unwrap_or(default));
        HostPaths {
            settings: resolve(raw.settings.as_deref(), ".mdpost/settings.json"),
            templates: resolve(raw.templates.as_deref(), "templates"),
            assets: resolve(raw.assets.as_deref(), "assets"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_paths() {
        let config = HostConfig::default_with_base(Path::new("/work"));
        assert_eq!(
            config.paths_resolved,
            HostPaths {
                settings: PathBuf::from("/work/.mdpost/settings.json"),
                templates: PathBuf::from("/work/templates"),
                assets: PathBuf::from("/work/assets"),
            }
        );
        assert!(config.render.gfm);
        assert_eq!(config.render.template, None);
    }

    #[test]
    fn test_load_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[paths]
templates = "layouts"

[render]
template = "article"
gfm = false
"#,
        )
        .unwrap();

        let config = HostConfig::load(Some(&path), None).unwrap();
        assert_eq!(config.paths_resolved.templates, dir.path().join("layouts"));
        assert_eq!(config.paths_resolved.assets, dir.path().join("assets"));
        assert_eq!(config.render.template.as_deref(), Some("article"));
        assert!(!config.render.gfm);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = HostConfig::load(Some(Path::new("/definitely/not/here.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[paths\n").unwrap();

        let err = HostConfig::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_cli_settings_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[render]\ntemplate = \"article\"\n").unwrap();

        let cli = CliSettings {
            template: Some("letter".to_owned()),
            assets_dir: Some(PathBuf::from("/vault")),
            ..CliSettings::default()
        };
        let config = HostConfig::load(Some(&path), Some(&cli)).unwrap();
        assert_eq!(config.render.template.as_deref(), Some("letter"));
        assert_eq!(config.paths_resolved.assets, PathBuf::from("/vault"));
    }
}
