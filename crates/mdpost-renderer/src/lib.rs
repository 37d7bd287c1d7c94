//! Markdown to HTML engine with pluggable token rules.
//!
//! [`MarkdownRenderer`] walks `pulldown-cmark` events and produces HTML.
//! Headings, code blocks, images, math and footnotes are offered as
//! [`Token`]s to attached [`TokenRule`]s before default rendering, which is
//! how parse-time plugins shape the output.
//!
//! # Example
//!
//! ```
//! use mdpost_renderer::MarkdownRenderer;
//!
//! let result = MarkdownRenderer::new()
//!     .with_title_extraction()
//!     .render_markdown("# Hello\n\n**Bold** text");
//! assert_eq!(result.title.as_deref(), Some("Hello"));
//! ```

mod html;
mod regions;
mod renderer;
mod rule;
mod state;
mod util;

pub use html::AlertKind;
pub use regions::{code_ranges, prose_ranges};
pub use renderer::{MarkdownRenderer, RenderResult};
pub use rule::{RuleError, RuleOutput, Token, TokenRule, parse_fence_info};
pub use state::{TocEntry, escape_html, slugify};
