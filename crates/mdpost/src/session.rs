//! Host session wiring shared by the commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use mdpost_config::{CliSettings, ConfigStore, FileSettingsSink, HostConfig};
use mdpost_pipeline::{HostContext, PipelineManager};
use mdpost_plugins::build_registry;

use crate::assets::FsAssetResolver;
use crate::error::CliError;
use crate::output::Output;

/// Options locating the host configuration.
#[derive(Args, Debug, Default)]
pub(crate) struct SessionArgs {
    /// Path to configuration file (default: auto-discover mdpost.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Settings blob path (overrides config).
    #[arg(long, env = "MDPOST_SETTINGS")]
    pub settings: Option<PathBuf>,
}

/// Loaded host configuration plus the plugin manager built for it.
pub(crate) struct Session {
    pub host_config: HostConfig,
    pub host: HostContext,
    pub manager: PipelineManager,
}

impl Session {
    /// Load config and settings, then register every plugin.
    ///
    /// With `persist`, config writes go back to the settings file.
    pub(crate) fn open(
        args: &SessionArgs,
        mut cli_settings: CliSettings,
        persist: bool,
    ) -> Result<Self, CliError> {
        cli_settings.settings_path.clone_from(&args.settings);
        let host_config = HostConfig::load(args.config.as_deref(), Some(&cli_settings))?;
        let paths = &host_config.paths_resolved;

        let mut store = ConfigStore::load(&paths.settings)?;
        if persist {
            store = store.with_sink(FileSettingsSink::new(&paths.settings));
        }
        tracing::debug!(settings = %paths.settings.display(), "settings loaded");

        let host = HostContext::new(Arc::new(store))
            .with_assets(FsAssetResolver::new(&paths.assets))
            .with_notices(|plugin: &str, message: &str| {
                Output::new().warning(&format!("{plugin}: {message}"));
            });
        let manager = build_registry(&host)?;

        Ok(Self {
            host_config,
            host,
            manager,
        })
    }
}
