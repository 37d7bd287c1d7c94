//! Collaborators the host hands to the pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use mdpost_capture::CaptureStore;
use mdpost_config::ConfigStore;

/// Looks up host assets (vault images, attachments) by name.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// URL or path for `name`, or `None` when the host has no such asset.
    async fn resolve(&self, name: &str) -> Option<String>;
}

/// Resolver for hosts without an asset store.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAssets;

#[async_trait]
impl AssetResolver for NoAssets {
    async fn resolve(&self, _name: &str) -> Option<String> {
        None
    }
}

/// User-facing notices raised by plugins (a missing image, a bad value).
pub trait NoticeSink: Send + Sync {
    fn notify(&self, plugin: &str, message: &str);
}

/// Sends notices to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotices;

impl NoticeSink for TracingNotices {
    fn notify(&self, plugin: &str, message: &str) {
        tracing::warn!(plugin, "{message}");
    }
}

impl<F> NoticeSink for F
where
    F: Fn(&str, &str) + Send + Sync,
{
    fn notify(&self, plugin: &str, message: &str) {
        self(plugin, message);
    }
}

/// Everything a plugin registry needs from the host for one session.
#[derive(Clone)]
pub struct HostContext {
    pub config: Arc<ConfigStore>,
    pub captures: Arc<CaptureStore>,
    pub assets: Arc<dyn AssetResolver>,
    pub notices: Arc<dyn NoticeSink>,
}

impl HostContext {
    /// Context with a fresh capture store, no assets, and notices sent to
    /// the log.
    #[must_use]
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self {
            config,
            captures: Arc::new(CaptureStore::new()),
            assets: Arc::new(NoAssets),
            notices: Arc::new(TracingNotices),
        }
    }

    #[must_use]
    pub fn with_assets(mut self, assets: impl AssetResolver + 'static) -> Self {
        self.assets = Arc::new(assets);
        self
    }

    #[must_use]
    pub fn with_notices(mut self, notices: impl NoticeSink + 'static) -> Self {
        self.notices = Arc::new(notices);
        self
    }
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("config", &self.config)
            .field("captures", &self.captures)
            .finish_non_exhaustive()
    }
}
