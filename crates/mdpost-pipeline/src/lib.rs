//! Two-phase document transformation pipeline.
//!
//! Parse-time plugins ([`ParseTimePlugin`]) attach token rules to the parse
//! engine and get `prepare`/`preprocess`/`postprocess` hooks around it.
//! Post-render plugins ([`PostRenderPlugin`]) fold over the complete HTML in
//! registration order. A [`Pipeline`] ties both phases to template
//! application for one host session:
//!
//! ```text
//! source -> DocumentParser -> PipelineManager::process_content -> TemplateEngine::apply
//! ```
//!
//! Every plugin invocation is an error boundary: a failure is logged and the
//! plugin acts as identity for that step.

mod error;
mod host;
mod manager;
mod parser;
mod plugin;
mod session;

pub use error::PipelineError;
pub use host::{AssetResolver, HostContext, NoAssets, NoticeSink, TracingNotices};
pub use manager::{PipelineManager, PluginHandle};
pub use parser::{DocumentParser, ParsedDocument};
pub use plugin::{
    Capability, HookContext, ParseTimePlugin, PluginData, PluginError, PluginKind,
    PostRenderPlugin, ProcessContext,
};
pub use session::{Pipeline, RenderGeneration, RenderedArticle, error_fragment};
