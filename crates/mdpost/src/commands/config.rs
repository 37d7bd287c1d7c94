//! `mdpost config` command implementation.

use clap::{Args, Subcommand};
use mdpost_config::{CliSettings, ConfigMap, ConfigValue, FieldKind, MetaField};
use mdpost_pipeline::{Capability, PipelineError};

use crate::error::CliError;
use crate::output::Output;
use crate::session::{Session, SessionArgs};

/// Plugin configuration commands.
#[derive(Subcommand)]
pub(crate) enum ConfigCommand {
    /// Set one config value of a plugin.
    Set(SetArgs),
    /// Enable a plugin.
    Enable(ToggleArgs),
    /// Disable a plugin.
    Disable(ToggleArgs),
}

/// Arguments for `config set`.
#[derive(Args)]
pub(crate) struct SetArgs {
    /// Plugin name.
    plugin: String,
    /// Config key, as listed by `mdpost plugins`.
    key: String,
    /// New value. Switches take `true`/`false`; selects one of their options.
    value: String,

    #[command(flatten)]
    session: SessionArgs,
}

/// Arguments for `config enable` and `config disable`.
#[derive(Args)]
pub(crate) struct ToggleArgs {
    /// Plugin name.
    plugin: String,

    #[command(flatten)]
    session: SessionArgs,
}

impl ConfigCommand {
    /// Execute the config command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Set(args) => args.execute(),
            Self::Enable(args) => args.execute(true),
            Self::Disable(args) => args.execute(false),
        }
    }
}

impl SetArgs {
    fn execute(self) -> Result<(), CliError> {
        let session = Session::open(&self.session, CliSettings::default(), true)?;
        let handle = session
            .manager
            .plugin(&self.plugin)
            .ok_or_else(|| PipelineError::UnknownPlugin(self.plugin.clone()))?;

        let meta = handle.meta_config();
        let field = meta.get(&self.key).ok_or_else(|| {
            let known: Vec<&str> = meta.iter().map(|(key, _)| key).collect();
            CliError::Validation(format!(
                "plugin '{}' has no config key '{}' (known: {})",
                self.plugin,
                self.key,
                if known.is_empty() {
                    "none".to_owned()
                } else {
                    known.join(", ")
                }
            ))
        })?;
        let value = parse_value(field, &self.value)?;

        handle.update_config(&ConfigMap::from([(self.key.clone(), value)]));
        Output::new().success(&format!("{}.{} = {}", self.plugin, self.key, self.value));
        Ok(())
    }
}

impl ToggleArgs {
    fn execute(self, enabled: bool) -> Result<(), CliError> {
        let output = Output::new();
        let session = Session::open(&self.session, CliSettings::default(), true)?;
        let handle = session
            .manager
            .plugin(&self.plugin)
            .ok_or_else(|| PipelineError::UnknownPlugin(self.plugin.clone()))?;

        handle.set_enabled(enabled);
        let state = if enabled { "enabled" } else { "disabled" };
        output.success(&format!("{} {state}", self.plugin));
        if handle.capability() == Capability::ParseTime {
            output.info("Parse-time plugin: takes effect from the next render session.");
        }
        Ok(())
    }
}

/// Convert a CLI string to the value type the field expects.
fn parse_value(field: &MetaField, raw: &str) -> Result<ConfigValue, CliError> {
    match field.kind {
        FieldKind::Switch => match raw {
            "true" | "on" | "yes" => Ok(ConfigValue::Bool(true)),
            "false" | "off" | "no" => Ok(ConfigValue::Bool(false)),
            other => Err(CliError::Validation(format!(
                "'{}' expects true or false, got '{other}'",
                field.title
            ))),
        },
        FieldKind::Select => {
            if field.options.iter().any(|option| option.value == raw) {
                Ok(ConfigValue::from(raw))
            } else {
                let choices: Vec<&str> = field.options.iter().map(|o| o.value.as_str()).collect();
                Err(CliError::Validation(format!(
                    "'{}' must be one of {}, got '{raw}'",
                    field.title,
                    choices.join(", ")
                )))
            }
        }
        FieldKind::Input => Ok(ConfigValue::from(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdpost_config::MetaConfig;
    use pretty_assertions::assert_eq;

    fn meta() -> MetaConfig {
        MetaConfig::new()
            .switch("lineNumbers", "Show line numbers")
            .select("unit", "Width unit", &[("px", "Pixels"), ("%", "Percent")])
            .input("title", "Title")
    }

    #[test]
    fn test_parse_switch() {
        let meta = meta();
        let field = meta.get("lineNumbers").unwrap();
        assert_eq!(parse_value(field, "on").unwrap(), ConfigValue::Bool(true));
        assert_eq!(parse_value(field, "false").unwrap(), ConfigValue::Bool(false));
        assert!(matches!(
            parse_value(field, "maybe"),
            Err(CliError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_select() {
        let meta = meta();
        let field = meta.get("unit").unwrap();
        assert_eq!(parse_value(field, "%").unwrap(), ConfigValue::from("%"));
        let err = parse_value(field, "em").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'Width unit' must be one of px, %, got 'em'"
        );
    }

    #[test]
    fn test_parse_input_keeps_text() {
        let meta = meta();
        let field = meta.get("title").unwrap();
        assert_eq!(
            parse_value(field, "true").unwrap(),
            ConfigValue::from("true")
        );
    }
}
