use mdpost_template::TemplateError;

/// Pipeline failure.
///
/// Plugin failures never surface here: they are logged and the plugin is
/// treated as identity.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A plugin with this name is already registered.
    #[error("plugin '{0}' is already registered")]
    DuplicatePlugin(String),
    /// No plugin with this name is registered.
    #[error("unknown plugin '{0}'")]
    UnknownPlugin(String),
    /// Template application failed.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// A newer render started before this one finished.
    #[error("render {ticket} superseded by render {current}")]
    Superseded { ticket: u64, current: u64 },
}
