//! Captioned, size-constrained images.

use std::ops::Range;

use mdpost_capture::markup::Element;
use mdpost_config::{ConfigMap, ConfigValue, MetaConfig};
use mdpost_pipeline::{PluginError, PostRenderPlugin, ProcessContext};
use mdpost_renderer::escape_html;

use crate::splice::{Splices, editable_elements, open_tag, prepend_style};

const CAPTION_SOURCE_KEY: &str = "captionSource";
const MAX_WIDTH_KEY: &str = "maxWidth";
const DEFAULT_MAX_WIDTH: &str = "100%";

/// Where the caption text comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CaptionSource {
    Alt,
    Title,
    None,
}

impl CaptionSource {
    fn parse(value: &str) -> Result<Self, PluginError> {
        match value {
            "alt" => Ok(Self::Alt),
            "title" => Ok(Self::Title),
            "none" => Ok(Self::None),
            other => Err(PluginError::Config {
                key: CAPTION_SOURCE_KEY.to_owned(),
                message: format!("expected 'alt', 'title' or 'none', got '{other}'"),
            }),
        }
    }

    fn caption<'a>(self, img: &'a Element) -> Option<&'a str> {
        let text = match self {
            Self::Alt => img.attr("alt"),
            Self::Title => img.attr("title"),
            Self::None => None,
        }?;
        let text = text.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// Replacement for one image.
struct Rewrite {
    /// The image, or a link wrapping nothing but the image.
    unit: Range<usize>,
    depth: usize,
    sized: String,
    figure: Option<String>,
}

/// Wraps images in `figure`/`figcaption` and constrains their width.
///
/// Figures never end up inside a paragraph: a paragraph holding a captioned
/// image as a direct child is split around the figure, and a link wrapping
/// only the image moves into the figure with it. Captioned images nested
/// deeper in inline markup are sized but not captioned. Math images and
/// images already inside a figure are left alone.
#[derive(Debug, Default)]
pub struct ImageCaptionPlugin;

impl ImageCaptionPlugin {
    pub const NAME: &'static str = "image-caption";

    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PostRenderPlugin for ImageCaptionPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta_config(&self) -> MetaConfig {
        MetaConfig::new()
            .select(
                CAPTION_SOURCE_KEY,
                "Caption source",
                &[("alt", "Alt text"), ("title", "Title"), ("none", "No caption")],
            )
            .input(MAX_WIDTH_KEY, "Maximum image width")
    }

    fn default_config(&self) -> ConfigMap {
        ConfigMap::from([
            (CAPTION_SOURCE_KEY.to_owned(), ConfigValue::from("alt")),
            (MAX_WIDTH_KEY.to_owned(), ConfigValue::from(DEFAULT_MAX_WIDTH)),
        ])
    }

    fn process(&self, html: &str, ctx: &ProcessContext<'_>) -> Result<String, PluginError> {
        let source = CaptionSource::parse(ctx.config.str_or(CAPTION_SOURCE_KEY, "alt"))?;
        let max_width = match ctx.config.str_or(MAX_WIDTH_KEY, DEFAULT_MAX_WIDTH).trim() {
            "" => DEFAULT_MAX_WIDTH,
            width => width,
        };
        let sizing = format!("max-width:{max_width};height:auto;display:block;margin:0 auto;");

        let elements = editable_elements(html);
        let figures: Vec<&Element> = elements.iter().filter(|el| el.tag == "figure").collect();
        let paragraphs: Vec<&Element> = elements.iter().filter(|el| el.tag == "p").collect();

        let mut rewrites = Vec::new();
        for (i, img) in elements.iter().enumerate() {
            if img.tag != "img" || img.has_class("mdpost-math") {
                continue;
            }
            if figures.iter().any(|fig| fig.inner.contains(&img.outer.start)) {
                continue;
            }

            let mut attrs = img.attrs.clone();
            prepend_style(&mut attrs, &sizing);
            let sized = open_tag("img", &attrs);

            let link = i
                .checked_sub(1)
                .and_then(|p| elements.get(p))
                .filter(|a| {
                    a.tag == "a"
                        && img.depth == a.depth + 1
                        && html[a.inner.clone()].trim() == &html[img.outer.clone()]
                });
            let (unit, depth, sized) = match link {
                Some(a) => (
                    a.outer.clone(),
                    a.depth,
                    format!("{}{sized}</a>", &html[a.open_tag.clone()]),
                ),
                None => (img.outer.clone(), img.depth, sized),
            };
            let figure = source.caption(img).map(|caption| {
                format!(
                    r#"<figure class="image-figure">{sized}<figcaption class="image-caption">{}</figcaption></figure>"#,
                    escape_html(caption)
                )
            });
            rewrites.push(Rewrite {
                unit,
                depth,
                sized,
                figure,
            });
        }

        let mut splices = Splices::new();
        for p in &paragraphs {
            let splits = rewrites
                .iter()
                .any(|r| r.figure.is_some() && is_child_of(r, p));
            if splits {
                splices.replace(p.outer.clone(), split_paragraph(html, p, &rewrites));
            }
        }
        for rewrite in rewrites {
            let in_paragraph = paragraphs
                .iter()
                .any(|p| p.inner.contains(&rewrite.unit.start));
            let with = match rewrite.figure {
                Some(figure) if !in_paragraph => figure,
                _ => rewrite.sized,
            };
            splices.replace(rewrite.unit, with);
        }

        if splices.is_empty() {
            return Ok(html.to_owned());
        }
        Ok(splices.apply(html))
    }
}

fn is_child_of(rewrite: &Rewrite, p: &Element) -> bool {
    rewrite.depth == p.depth + 1 && p.inner.contains(&rewrite.unit.start)
}

/// Rebuild paragraph `p` with its captioned child images lifted out as
/// figures between paragraph pieces. Blank pieces are dropped.
fn split_paragraph(html: &str, p: &Element, rewrites: &[Rewrite]) -> String {
    let open = &html[p.open_tag.clone()];
    let mut out = String::new();
    let mut piece = String::new();
    let mut cursor = p.inner.start;

    let flush = |piece: &mut String, out: &mut String| {
        if !piece.trim().is_empty() {
            out.push_str(open);
            out.push_str(piece);
            out.push_str("</p>");
        }
        piece.clear();
    };

    for rewrite in rewrites {
        if !p.inner.contains(&rewrite.unit.start) || rewrite.unit.start < cursor {
            continue;
        }
        piece.push_str(&html[cursor..rewrite.unit.start]);
        cursor = rewrite.unit.end;
        match &rewrite.figure {
            Some(figure) if is_child_of(rewrite, p) => {
                flush(&mut piece, &mut out);
                out.push_str(figure);
            }
            _ => piece.push_str(&rewrite.sized),
        }
    }
    piece.push_str(&html[cursor..p.inner.end]);
    flush(&mut piece, &mut out);
    out
}
