//! Built-in plugins for the mdpost pipeline.
//!
//! Parse-time plugins shape token rendering; post-render plugins rewrite the
//! finished HTML. [`build_registry`] registers all of them in their fixed
//! order against a [`HostContext`](mdpost_pipeline::HostContext):
//!
//! | Phase       | Plugins                                                                  |
//! |-------------|--------------------------------------------------------------------------|
//! | parse-time  | `wiki-image`, `heading`, `math`, `footnote`, `card`                      |
//! | post-render | `card-restore`, `code-highlight`, `image-caption`, `table-wrap`, `inline-style` |
//!
//! Post-render plugins never modify markup inside restored capture regions.

mod parse_time;
mod post_render;
mod registry;
mod splice;

pub use parse_time::{CardPlugin, FootnotePlugin, HeadingPlugin, MathPlugin, WikiImagePlugin};
pub use post_render::{
    CardRestorePlugin, CodeHighlightPlugin, ImageCaptionPlugin, InlineStylePlugin,
    TableWrapPlugin,
};
pub use registry::{PluginRegistry, build_registry};
