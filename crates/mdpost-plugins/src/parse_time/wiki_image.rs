//! `![[name|size]]` image embeds resolved through the host.

use std::fmt::Write;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use mdpost_config::{ConfigMap, ConfigValue, MetaConfig};
use mdpost_pipeline::{AssetResolver, HookContext, NoticeSink, ParseTimePlugin, PluginError};
use mdpost_renderer::{TokenRule, escape_html, prose_ranges};
use regex::{Captures, Regex};

const WIDTH_UNIT_KEY: &str = "widthUnit";

static EMBED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[\[([^\]|]+)(?:\|([^\]]*))?\]\]").expect("invalid embed regex")
});

static SIZE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:x(\d+))?$").expect("invalid size regex"));

/// Rewrites wiki-style image embeds into `<img>` elements before parsing.
///
/// The part after `|` is either a size (`300` or `300x200`) or alt text.
/// Embeds naming an asset the host cannot resolve are left as written and
/// reported through the notice sink. Code blocks and inline code are not
/// touched.
pub struct WikiImagePlugin {
    assets: Arc<dyn AssetResolver>,
    notices: Arc<dyn NoticeSink>,
    width_unit: String,
}

impl WikiImagePlugin {
    pub const NAME: &'static str = "wiki-image";

    #[must_use]
    pub fn new(assets: Arc<dyn AssetResolver>, notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            assets,
            notices,
            width_unit: "px".to_owned(),
        }
    }

    fn image_tag(&self, name: &str, src: &str, option: Option<&str>) -> String {
        let option = option.map(str::trim).unwrap_or_default();
        let (alt, style) = match SIZE_PATTERN.captures(option) {
            Some(size) => {
                let mut style = format!("width:{}{};", &size[1], self.width_unit);
                if let Some(height) = size.get(2) {
                    write!(style, "height:{}px;", height.as_str()).unwrap();
                }
                (name, Some(style))
            }
            None if option.is_empty() => (name, None),
            None => (option, None),
        };

        let mut tag = format!(
            r#"<img src="{}" alt="{}" data-wiki="{}""#,
            escape_html(src),
            escape_html(alt),
            escape_html(name)
        );
        if let Some(style) = style {
            write!(tag, r#" style="{style}""#).unwrap();
        }
        tag.push('>');
        tag
    }
}

impl std::fmt::Debug for WikiImagePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiImagePlugin")
            .field("width_unit", &self.width_unit)
            .finish_non_exhaustive()
    }
}

impl TokenRule for WikiImagePlugin {
    fn name(&self) -> &str {
        Self::NAME
    }
}

#[async_trait]
impl ParseTimePlugin for WikiImagePlugin {
    fn meta_config(&self) -> MetaConfig {
        MetaConfig::new().select(
            WIDTH_UNIT_KEY,
            "Width unit",
            &[("px", "Pixels"), ("%", "Percent")],
        )
    }

    fn default_config(&self) -> ConfigMap {
        ConfigMap::from([(WIDTH_UNIT_KEY.to_owned(), ConfigValue::from("px"))])
    }

    async fn prepare(&mut self, ctx: &HookContext<'_>) -> Result<(), PluginError> {
        let unit = ctx.config.str_or(WIDTH_UNIT_KEY, "px");
        self.width_unit = match unit {
            "px" | "%" => unit.to_owned(),
            other => {
                return Err(PluginError::Config {
                    key: WIDTH_UNIT_KEY.to_owned(),
                    message: format!("expected 'px' or '%', got '{other}'"),
                });
            }
        };
        Ok(())
    }

    async fn preprocess(&mut self, source: &str, _ctx: &HookContext<'_>) -> Result<String, PluginError> {
        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;

        for range in prose_ranges(source) {
            let embeds: Vec<Captures<'_>> =
                EMBED_PATTERN.captures_iter(&source[range.clone()]).collect();
            for caps in embeds {
                let Some(whole) = caps.get(0) else { continue };
                let name = caps[1].trim();
                let Some(src) = self.assets.resolve(name).await else {
                    self.notices
                        .notify(Self::NAME, &format!("image not found: {name}"));
                    continue;
                };
                let start = range.start + whole.start();
                out.push_str(&source[cursor..start]);
                out.push_str(&self.image_tag(name, &src, caps.get(2).map(|m| m.as_str())));
                cursor = range.start + whole.end();
            }
        }

        out.push_str(&source[cursor..]);
        Ok(out)
    }
}
