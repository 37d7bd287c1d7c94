//! Fenced `card` blocks passed through verbatim.

use std::sync::Arc;

use async_trait::async_trait;
use mdpost_capture::{CaptureStore, placeholder_with_class};
use mdpost_pipeline::{HookContext, ParseTimePlugin, PluginError};
use mdpost_renderer::{RuleError, RuleOutput, Token, TokenRule};

const LANGUAGE: &str = "card";

/// Captures the raw body of every `card` fence and emits a placeholder in
/// its place, so widget markup reaches the output byte for byte.
///
/// ````markdown
/// ```card id="profile"
/// <mp-common-profile data-id="..."></mp-common-profile>
/// ```
/// ````
///
/// Fences without an `id` attribute get `card-1`, `card-2`, ... in document
/// order.
#[derive(Debug)]
pub struct CardPlugin {
    captures: Arc<CaptureStore>,
    generated: usize,
}

impl CardPlugin {
    pub const NAME: &'static str = "card";

    #[must_use]
    pub fn new(captures: Arc<CaptureStore>) -> Self {
        Self {
            captures,
            generated: 0,
        }
    }
}

impl TokenRule for CardPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render_token(&mut self, token: &Token<'_>) -> Result<RuleOutput, RuleError> {
        let Token::CodeBlock {
            language: Some(LANGUAGE),
            attrs,
            source,
            ..
        } = *token
        else {
            return Ok(RuleOutput::PassThrough);
        };

        let id = match attrs.get("id").filter(|id| !id.is_empty()) {
            Some(id) => id.clone(),
            None => {
                self.generated += 1;
                format!("card-{}", self.generated)
            }
        };
        let raw = source.strip_suffix('\n').unwrap_or(source);
        self.captures.put(id.as_str(), raw);
        tracing::debug!(id = %id, bytes = raw.len(), "card captured");

        Ok(RuleOutput::Html(placeholder_with_class(&id, LANGUAGE)))
    }
}

#[async_trait]
impl ParseTimePlugin for CardPlugin {
    async fn prepare(&mut self, _ctx: &HookContext<'_>) -> Result<(), PluginError> {
        self.generated = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdpost_renderer::MarkdownRenderer;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_card_with_explicit_id() {
        let captures = Arc::new(CaptureStore::new());
        let mut plugin = CardPlugin::new(Arc::clone(&captures));
        let html = MarkdownRenderer::new()
            .with_rule(&mut plugin)
            .render_markdown("```card id=\"x\"\n<payload a=\"1\"/>\n```\n")
            .html;

        assert_eq!(
            html,
            r#"<section class="mdpost-capture card" data-id="x"></section>"#
        );
        assert_eq!(captures.get("x").as_deref(), Some(r#"<payload a="1"/>"#));
    }

    #[test]
    fn test_generated_ids_in_order() {
        let captures = Arc::new(CaptureStore::new());
        let mut plugin = CardPlugin::new(Arc::clone(&captures));
        let html = MarkdownRenderer::new()
            .with_rule(&mut plugin)
            .render_markdown("```card\none\n```\n\n```card\ntwo\n```\n")
            .html;

        assert!(html.contains(r#"data-id="card-1""#));
        assert!(html.contains(r#"data-id="card-2""#));
        assert_eq!(captures.get("card-2").as_deref(), Some("two"));
    }

    #[test]
    fn test_other_code_blocks_pass() {
        let captures = Arc::new(CaptureStore::new());
        let mut plugin = CardPlugin::new(Arc::clone(&captures));
        let html = MarkdownRenderer::new()
            .with_rule(&mut plugin)
            .render_markdown("```rust\nfn main() {}\n```\n")
            .html;

        assert!(html.starts_with(r#"<pre><code class="language-rust">"#));
        assert!(captures.is_empty());
    }
}
