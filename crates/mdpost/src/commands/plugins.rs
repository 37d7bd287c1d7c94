//! `mdpost plugins` command implementation.

use clap::Args;
use mdpost_config::CliSettings;

use crate::error::CliError;
use crate::output::Output;
use crate::session::{Session, SessionArgs};

/// Arguments for the plugins command.
#[derive(Args)]
pub(crate) struct PluginsArgs {
    #[command(flatten)]
    session: SessionArgs,
}

impl PluginsArgs {
    /// Print every plugin's name, capability, config and schema.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let session = Session::open(&self.session, CliSettings::default(), false)?;
        let json = serde_json::to_string_pretty(&session.manager.export())?;
        Output::new().document(&json)?;
        Ok(())
    }
}
