//! Restores captured card content into its placeholders.

use std::sync::Arc;

use mdpost_capture::CaptureStore;
use mdpost_pipeline::{PluginError, PostRenderPlugin, ProcessContext};

/// Fills every capture placeholder with its stored raw content.
///
/// Registered first among post-render plugins; later plugins see the
/// restored markup but skip it as a protected region.
#[derive(Debug)]
pub struct CardRestorePlugin {
    captures: Arc<CaptureStore>,
}

impl CardRestorePlugin {
    pub const NAME: &'static str = "card-restore";

    #[must_use]
    pub fn new(captures: Arc<CaptureStore>) -> Self {
        Self { captures }
    }
}

impl PostRenderPlugin for CardRestorePlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&self, html: &str, _ctx: &ProcessContext<'_>) -> Result<String, PluginError> {
        if self.captures.is_empty() {
            return Ok(html.to_owned());
        }
        Ok(self.captures.restore_all(html))
    }
}
