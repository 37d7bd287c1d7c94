//! Theme rules inlined into `style` attributes.

use mdpost_capture::markup::Element;
use mdpost_config::{DEFAULT_ACCENT, DEFAULT_HIGHLIGHT, DEFAULT_THEME, Settings};
use mdpost_pipeline::{PluginError, PostRenderPlugin, ProcessContext};

use super::theme::{self, Rules};
use crate::splice::{Splices, editable_elements, open_tag, prepend_style};

/// Inlines the active theme and code palette, since target platforms drop
/// stylesheets.
///
/// Tag rules apply first, then class rules in class order; declarations
/// already on the element come last and win. Code inside highlighted blocks
/// takes only palette rules.
#[derive(Debug, Default)]
pub struct InlineStylePlugin;

impl InlineStylePlugin {
    pub const NAME: &'static str = "inline-style";

    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn resolve_rules(settings: &Settings) -> (Rules, Rules) {
    let rules = theme::theme(&settings.theme).unwrap_or_else(|| {
        tracing::warn!(theme = %settings.theme, "unknown theme, using {DEFAULT_THEME}");
        theme::DEFAULT_STYLE
    });
    let palette = theme::palette(&settings.highlight).unwrap_or_else(|| {
        tracing::warn!(highlight = %settings.highlight, "unknown highlight style, using {DEFAULT_HIGHLIGHT}");
        theme::GITHUB_PALETTE
    });
    (rules, palette)
}

fn declarations(element: &Element, theme: Rules, palette: Rules) -> String {
    let classes: Vec<&str> = element
        .attr("class")
        .map(|c| c.split_whitespace().collect())
        .unwrap_or_default();
    let highlighted = classes.iter().any(|c| c.starts_with("hljs"));

    let mut out = String::new();
    for rules in [theme, palette] {
        if !highlighted {
            for (_, css) in rules.iter().filter(|(sel, _)| *sel == element.tag) {
                out.push_str(css);
            }
        }
        for class in &classes {
            for (_, css) in rules
                .iter()
                .filter(|(sel, _)| sel.strip_prefix('.') == Some(*class))
            {
                out.push_str(css);
            }
        }
    }
    out
}

impl PostRenderPlugin for InlineStylePlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&self, html: &str, ctx: &ProcessContext<'_>) -> Result<String, PluginError> {
        let (theme, palette) = resolve_rules(ctx.settings);
        let accent = ctx.settings.accent_override().unwrap_or(DEFAULT_ACCENT);

        let mut splices = Splices::new();
        for element in editable_elements(html) {
            let css = declarations(&element, theme, palette);
            if css.is_empty() {
                continue;
            }
            let mut attrs = element.attrs.clone();
            prepend_style(&mut attrs, &css.replace("{accent}", accent));
            splices.replace(element.open_tag.clone(), open_tag(&element.tag, &attrs));
        }
        Ok(splices.apply(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdpost_capture::placeholder;
    use mdpost_config::PluginConfig;
    use pretty_assertions::assert_eq;

    fn process(html: &str, settings: &Settings) -> String {
        let config = PluginConfig::default();
        InlineStylePlugin::new()
            .process(
                html,
                &ProcessContext {
                    settings,
                    config: &config,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_theme_rules_inlined() {
        let html = r#"<p>a <a href="https://x.dev">x</a></p>"#;
        assert_eq!(
            process(html, &Settings::default()),
            concat!(
                r#"<p style="margin:1.5em 8px;letter-spacing:0.1em;color:#3f3f3f;line-height:1.75;font-size:15px;">"#,
                r#"a <a href="https://x.dev" style="color:#576b95;text-decoration:none;">x</a></p>"#
            )
        );
    }

    #[test]
    fn test_custom_accent() {
        let settings = Settings {
            use_custom_color: true,
            custom_color: "#ff0000".to_owned(),
            ..Settings::default()
        };
        let result = process("<h2>T</h2><strong>b</strong>", &settings);
        assert!(result.contains("background:#ff0000;"));
        assert!(result.contains(r#"<strong style="color:#ff0000;font-weight:bold;">"#));

        let result = process("<strong>b</strong>", &Settings::default());
        assert!(result.contains(&format!("color:{DEFAULT_ACCENT};")));
    }

    #[test]
    fn test_existing_style_wins() {
        let result = process(r#"<td style="padding:0">1</td>"#, &Settings::default());
        assert_eq!(
            result,
            r#"<td style="border:1px solid #dfdfdf;padding:0.25em 0.5em;padding:0">1</td>"#
        );
    }

    #[test]
    fn test_highlighted_code_takes_palette_only() {
        let settings = Settings {
            highlight: "monokai".to_owned(),
            ..Settings::default()
        };
        let html = r#"<code class="hljs"><span class="hljs-keyword">fn</span></code>"#;
        assert_eq!(
            process(html, &settings),
            concat!(
                r#"<code class="hljs" style="display:block;padding:0.5em 1em;color:#f8f8f2;background:#272822;">"#,
                r#"<span class="hljs-keyword" style="color:#f92672;">fn</span></code>"#
            )
        );
    }

    #[test]
    fn test_captured_content_untouched() {
        let html = format!(
            "<hr>{}",
            placeholder("w").replace("></section>", "><p>raw</p></section>")
        );
        let result = process(&html, &Settings::default());
        assert!(result.ends_with(r#"<section class="mdpost-capture" data-id="w"><p>raw</p></section>"#));
        assert!(result.starts_with("<hr style="));
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let settings = Settings {
            theme: "neon".to_owned(),
            ..Settings::default()
        };
        assert_eq!(
            process("<li>x</li>", &settings),
            r#"<li style="margin:0.2em 8px;">x</li>"#
        );
    }
}
