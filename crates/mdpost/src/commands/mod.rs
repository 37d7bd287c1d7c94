//! CLI command implementations.

pub(crate) mod config;
pub(crate) mod plugins;
pub(crate) mod render;

pub(crate) use config::ConfigCommand;
pub(crate) use plugins::PluginsArgs;
pub(crate) use render::RenderArgs;
