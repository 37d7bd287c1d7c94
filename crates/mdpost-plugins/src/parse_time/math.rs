//! TeX math rendering.

use async_trait::async_trait;
use mdpost_config::{ConfigMap, ConfigValue, MetaConfig};
use mdpost_pipeline::{HookContext, ParseTimePlugin, PluginError};
use mdpost_renderer::{RuleError, RuleOutput, Token, TokenRule, escape_html};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

const SERVICE_KEY: &str = "service";

/// Marker in a service URL replaced by the encoded formula. Without it the
/// formula is appended.
const TEX_MARKER: &str = "{tex}";

/// Renders `$...$` and `$$...$$`.
///
/// With an image `service` configured, formulas become `<img>` elements
/// pointing at the service, which survive copy-paste into editors without
/// script support. Otherwise the TeX is kept as escaped text in a tagged
/// element for client-side typesetting.
#[derive(Debug, Default)]
pub struct MathPlugin {
    service: String,
}

impl MathPlugin {
    pub const NAME: &'static str = "math";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn service_url(&self, tex: &str) -> String {
        let encoded = utf8_percent_encode(tex, NON_ALPHANUMERIC).to_string();
        if self.service.contains(TEX_MARKER) {
            self.service.replace(TEX_MARKER, &encoded)
        } else {
            format!("{}{encoded}", self.service)
        }
    }

    fn render(&self, tex: &str, display: bool) -> String {
        let mode = if display { "math-display" } else { "math-inline" };
        let tex = tex.trim();

        if self.service.is_empty() {
            let escaped = escape_html(tex);
            return if display {
                format!(
                    r#"<section class="mdpost-math {mode}" data-tex="{escaped}" style="text-align:center;">{escaped}</section>"#
                )
            } else {
                format!(r#"<span class="mdpost-math {mode}" data-tex="{escaped}">{escaped}</span>"#)
            };
        }

        let img = format!(
            r#"<img class="mdpost-math {mode}" src="{}" alt="{}">"#,
            escape_html(&self.service_url(tex)),
            escape_html(tex)
        );
        if display {
            format!(r#"<section style="text-align:center;margin:1em 0;">{img}</section>"#)
        } else {
            img
        }
    }
}

impl TokenRule for MathPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render_token(&mut self, token: &Token<'_>) -> Result<RuleOutput, RuleError> {
        match *token {
            Token::Math { tex, display } => Ok(RuleOutput::Html(self.render(tex, display))),
            _ => Ok(RuleOutput::PassThrough),
        }
    }
}

#[async_trait]
impl ParseTimePlugin for MathPlugin {
    fn meta_config(&self) -> MetaConfig {
        MetaConfig::new().input(SERVICE_KEY, "Formula image service URL")
    }

    fn default_config(&self) -> ConfigMap {
        ConfigMap::from([(SERVICE_KEY.to_owned(), ConfigValue::from(""))])
    }

    async fn prepare(&mut self, ctx: &HookContext<'_>) -> Result<(), PluginError> {
        self.service = ctx.config.str_or(SERVICE_KEY, "").trim().to_owned();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdpost_renderer::MarkdownRenderer;
    use pretty_assertions::assert_eq;

    fn with_service(service: &str) -> MathPlugin {
        MathPlugin {
            service: service.to_owned(),
        }
    }

    #[test]
    fn test_inline_text_mode() {
        let mut plugin = MathPlugin::new();
        let html = MarkdownRenderer::new()
            .with_rule(&mut plugin)
            .render_markdown("Area $x^2$ here")
            .html;
        assert_eq!(
            html,
            r#"<p>Area <span class="mdpost-math math-inline" data-tex="x^2">x^2</span> here</p>"#
        );
    }

    #[test]
    fn test_text_mode_escapes() {
        let html = MathPlugin::new().render("a<b", false);
        assert_eq!(
            html,
            r#"<span class="mdpost-math math-inline" data-tex="a&lt;b">a&lt;b</span>"#
        );
    }

    #[test]
    fn test_display_text_mode() {
        let html = MathPlugin::new().render(" x^2 ", true);
        assert_eq!(
            html,
            r#"<section class="mdpost-math math-display" data-tex="x^2" style="text-align:center;">x^2</section>"#
        );
    }

    #[test]
    fn test_service_appends_encoded_tex() {
        let html = with_service("https://math.example/svg?tex=").render("a+b", false);
        assert_eq!(
            html,
            r#"<img class="mdpost-math math-inline" src="https://math.example/svg?tex=a%2Bb" alt="a+b">"#
        );
    }

    #[test]
    fn test_service_marker_substitution() {
        let html = with_service("https://math.example/{tex}.svg").render("x y", true);
        assert!(html.starts_with(r#"<section style="text-align:center;margin:1em 0;">"#));
        assert!(html.contains(r#"src="https://math.example/x%20y.svg""#));
    }

    #[test]
    fn test_other_tokens_pass() {
        let mut plugin = MathPlugin::new();
        let token = Token::FootnoteReference { label: "1" };
        assert_eq!(plugin.render_token(&token).unwrap(), RuleOutput::PassThrough);
    }
}
