//! Styled headings with optional section numbering.

use std::fmt::Write;

use async_trait::async_trait;
use mdpost_config::{ConfigMap, ConfigValue, MetaConfig};
use mdpost_pipeline::{HookContext, ParseTimePlugin, PluginError};
use mdpost_renderer::{RuleError, RuleOutput, Token, TokenRule, escape_html};

const ANCHOR_KEY: &str = "anchor";
const NUMBERED_KEY: &str = "numbered";

/// Renders headings as `prefix`/`content`/`suffix` spans so themes can style
/// each part. With `numbered` on, H2 and below get `1.2.` style prefixes; H1
/// is the title and stays unnumbered.
#[derive(Debug, Default)]
pub struct HeadingPlugin {
    anchor: bool,
    numbered: bool,
    counters: [u32; 5],
}

impl HeadingPlugin {
    pub const NAME: &'static str = "heading";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn number(&mut self, level: u8) -> String {
        let Some(depth) = usize::from(level).checked_sub(2) else {
            return String::new();
        };
        self.counters[depth] += 1;
        for counter in &mut self.counters[depth + 1..] {
            *counter = 0;
        }
        let mut prefix = String::new();
        for counter in &self.counters[..=depth] {
            write!(prefix, "{counter}.").unwrap();
        }
        prefix.push(' ');
        prefix
    }
}

impl TokenRule for HeadingPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render_token(&mut self, token: &Token<'_>) -> Result<RuleOutput, RuleError> {
        let Token::Heading {
            level, id, html, ..
        } = *token
        else {
            return Ok(RuleOutput::PassThrough);
        };

        let prefix = if self.numbered {
            self.number(level)
        } else {
            String::new()
        };
        let id_attr = if self.anchor {
            format!(r#" id="{}""#, escape_html(id))
        } else {
            String::new()
        };

        Ok(RuleOutput::Html(format!(
            concat!(
                r#"<h{level}{id_attr} class="mdpost-heading">"#,
                r#"<span class="prefix">{prefix}</span>"#,
                r#"<span class="content">{html}</span>"#,
                r#"<span class="suffix"></span></h{level}>"#
            ),
            level = level,
            id_attr = id_attr,
            prefix = escape_html(&prefix),
            html = html,
        )))
    }
}

#[async_trait]
impl ParseTimePlugin for HeadingPlugin {
    fn meta_config(&self) -> MetaConfig {
        MetaConfig::new()
            .switch(ANCHOR_KEY, "Keep heading anchors")
            .switch(NUMBERED_KEY, "Number sections")
    }

    fn default_config(&self) -> ConfigMap {
        ConfigMap::from([
            (ANCHOR_KEY.to_owned(), ConfigValue::from(true)),
            (NUMBERED_KEY.to_owned(), ConfigValue::from(false)),
        ])
    }

    async fn prepare(&mut self, ctx: &HookContext<'_>) -> Result<(), PluginError> {
        self.anchor = ctx.config.bool_or(ANCHOR_KEY, true);
        self.numbered = ctx.config.bool_or(NUMBERED_KEY, false);
        self.counters = [0; 5];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdpost_config::{PluginConfig, Settings};
    use mdpost_renderer::MarkdownRenderer;
    use pretty_assertions::assert_eq;

    async fn prepared(values: &[(&str, bool)]) -> HeadingPlugin {
        let mut config = PluginConfig::default();
        for (key, value) in values {
            config.values.insert((*key).to_owned(), ConfigValue::from(*value));
        }
        let settings = Settings::default();
        let mut plugin = HeadingPlugin::new();
        plugin
            .prepare(&HookContext {
                settings: &settings,
                config: &config,
            })
            .await
            .unwrap();
        plugin
    }

    #[tokio::test]
    async fn test_heading_spans() {
        let mut plugin = prepared(&[]).await;
        let html = MarkdownRenderer::new()
            .with_rule(&mut plugin)
            .render_markdown("## Hello *there*")
            .html;
        assert_eq!(
            html,
            concat!(
                r#"<h2 id="hello-there" class="mdpost-heading"><span class="prefix"></span>"#,
                r#"<span class="content">Hello <em>there</em></span><span class="suffix"></span></h2>"#
            )
        );
    }

    #[tokio::test]
    async fn test_numbering_resets_deeper_levels() {
        let mut plugin = prepared(&[(NUMBERED_KEY, true), (ANCHOR_KEY, false)]).await;
        let html = MarkdownRenderer::new()
            .with_rule(&mut plugin)
            .render_markdown("# T\n\n## A\n\n### A1\n\n### A2\n\n## B\n\n### B1")
            .html;

        let prefixes: Vec<&str> = html
            .split(r#"<span class="prefix">"#)
            .skip(1)
            .map(|rest| rest.split('<').next().unwrap())
            .collect();
        assert_eq!(prefixes, vec!["", "1. ", "1.1. ", "1.2. ", "2. ", "2.1. "]);
        assert!(!html.contains(" id="));
    }

    #[tokio::test]
    async fn test_prepare_resets_counters() {
        let mut plugin = prepared(&[(NUMBERED_KEY, true)]).await;
        assert_eq!(plugin.number(2), "1. ");
        assert_eq!(plugin.number(2), "2. ");

        let settings = Settings::default();
        let config = PluginConfig::default();
        plugin
            .prepare(&HookContext {
                settings: &settings,
                config: &config,
            })
            .await
            .unwrap();
        assert!(!plugin.numbered);
        assert_eq!(plugin.number(2), "1. ");
    }
}
