//! Registered plugins and the post-render fold.

use std::sync::Arc;

use mdpost_config::{ConfigMap, ConfigStore, MetaConfig, PluginConfig, Settings};

use crate::error::PipelineError;
use crate::plugin::{
    Capability, ParseTimePlugin, PluginData, PluginKind, PostRenderPlugin, ProcessContext,
};

/// Ordered set of uniquely named plugins sharing one config store.
///
/// Registration order is execution order within each capability.
pub struct PipelineManager {
    plugins: Vec<PluginKind>,
    config: Arc<ConfigStore>,
}

impl PipelineManager {
    #[must_use]
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self {
            plugins: Vec::new(),
            config,
        }
    }

    /// Register a plugin after the already registered ones.
    ///
    /// Fails on a duplicate name: config is keyed by name, so a second plugin
    /// would silently share the first one's settings. The plugin's default
    /// config is seeded into the store without overwriting stored values.
    pub fn register(&mut self, plugin: PluginKind) -> Result<(), PipelineError> {
        let name = plugin.name().to_owned();
        if self.find(&name).is_some() {
            return Err(PipelineError::DuplicatePlugin(name));
        }

        self.config.seed_defaults(&name, &plugin.default_config());
        tracing::debug!(plugin = %name, capability = %plugin.capability(), "plugin registered");
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn register_parse_time(
        &mut self,
        plugin: impl ParseTimePlugin + 'static,
    ) -> Result<(), PipelineError> {
        self.register(PluginKind::parse_time(plugin))
    }

    pub fn register_post_render(
        &mut self,
        plugin: impl PostRenderPlugin + 'static,
    ) -> Result<(), PipelineError> {
        self.register(PluginKind::post_render(plugin))
    }

    /// Parse-time plugins in registration order, enabled or not.
    #[must_use]
    pub fn parse_time_plugins(&self) -> Vec<&dyn ParseTimePlugin> {
        self.plugins
            .iter()
            .filter_map(|plugin| match plugin {
                PluginKind::ParseTime(p) => Some(p.as_ref()),
                PluginKind::PostRender(_) => None,
            })
            .collect()
    }

    /// Post-render plugins in registration order, enabled or not.
    #[must_use]
    pub fn post_render_plugins(&self) -> Vec<&dyn PostRenderPlugin> {
        self.plugins
            .iter()
            .filter_map(|plugin| match plugin {
                PluginKind::PostRender(p) => Some(p.as_ref()),
                PluginKind::ParseTime(_) => None,
            })
            .collect()
    }

    pub(crate) fn parse_time_plugins_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut (dyn ParseTimePlugin + 'static)> {
        self.plugins.iter_mut().filter_map(|plugin| match plugin {
            PluginKind::ParseTime(p) => Some(p.as_mut()),
            PluginKind::PostRender(_) => None,
        })
    }

    /// Run `html` through every enabled post-render plugin, reading enablement
    /// from a fresh settings snapshot.
    #[must_use]
    pub fn process_content(&self, html: &str) -> String {
        self.process_content_with(html, &self.config.snapshot())
    }

    /// Run `html` through every post-render plugin enabled in `settings`, in
    /// registration order.
    ///
    /// A failing plugin is logged and treated as identity; the fold continues
    /// with the next plugin.
    #[must_use]
    pub fn process_content_with(&self, html: &str, settings: &Settings) -> String {
        let mut html = html.to_owned();
        for plugin in self.post_render_plugins() {
            let name = plugin.name();
            let config = settings.plugin_config(name);
            if !config.enabled {
                continue;
            }
            let ctx = ProcessContext {
                settings,
                config: &config,
            };
            match plugin.process(&html, &ctx) {
                Ok(processed) => html = processed,
                Err(e) => {
                    tracing::error!(plugin = name, error = %e, "post-render plugin failed, output unchanged");
                }
            }
        }
        html
    }

    /// Handle for the plugin named `name`.
    #[must_use]
    pub fn plugin(&self, name: &str) -> Option<PluginHandle<'_>> {
        self.find(name).map(|plugin| PluginHandle {
            plugin,
            config: &self.config,
        })
    }

    /// Enable or disable a plugin.
    ///
    /// Post-render plugins see the change on the next `process_content`;
    /// parse-time plugins only after the parser is rebuilt.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<PluginConfig, PipelineError> {
        let handle = self.require(name)?;
        Ok(handle.set_enabled(enabled))
    }

    /// Shallow-merge `partial` into a plugin's config.
    pub fn update_config(
        &self,
        name: &str,
        partial: &ConfigMap,
    ) -> Result<PluginConfig, PipelineError> {
        let handle = self.require(name)?;
        Ok(handle.update_config(partial))
    }

    /// UI-facing projection of every plugin, in registration order.
    #[must_use]
    pub fn export(&self) -> Vec<PluginData> {
        let settings = self.config.snapshot();
        self.plugins
            .iter()
            .map(|plugin| {
                let config = settings.plugin_config(plugin.name());
                PluginData {
                    name: plugin.name().to_owned(),
                    capability: plugin.capability(),
                    enabled: config.enabled,
                    config: config.values,
                    meta_config: plugin.meta_config(),
                }
            })
            .collect()
    }

    /// Names of all plugins, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(PluginKind::name).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    #[must_use]
    pub fn config_store(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    fn find(&self, name: &str) -> Option<&PluginKind> {
        self.plugins.iter().find(|plugin| plugin.name() == name)
    }

    fn require(&self, name: &str) -> Result<PluginHandle<'_>, PipelineError> {
        self.plugin(name)
            .ok_or_else(|| PipelineError::UnknownPlugin(name.to_owned()))
    }
}

impl std::fmt::Debug for PipelineManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineManager")
            .field("plugins", &self.names())
            .finish_non_exhaustive()
    }
}

/// A registered plugin together with its slice of the config store.
#[derive(Clone, Copy)]
pub struct PluginHandle<'a> {
    plugin: &'a PluginKind,
    config: &'a ConfigStore,
}

impl PluginHandle<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    #[must_use]
    pub fn capability(&self) -> Capability {
        self.plugin.capability()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled(self.name())
    }

    pub fn set_enabled(&self, enabled: bool) -> PluginConfig {
        self.config.set_enabled(self.name(), enabled)
    }

    #[must_use]
    pub fn config(&self) -> PluginConfig {
        self.config.get(self.name())
    }

    pub fn update_config(&self, partial: &ConfigMap) -> PluginConfig {
        self.config.set(self.name(), partial)
    }

    #[must_use]
    pub fn meta_config(&self) -> MetaConfig {
        self.plugin.meta_config()
    }
}
