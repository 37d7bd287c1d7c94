//! Range-based rewriting of rendered HTML.

use std::ops::Range;

use mdpost_capture::PLACEHOLDER_CLASS;
use mdpost_capture::markup::{self, Element, ProtectedRanges};

/// Collects span replacements and applies them in one pass.
///
/// Spans are byte ranges of the original string. Overlapping spans keep the
/// first one added; everything outside the spans is copied unchanged.
#[derive(Debug, Default)]
pub(crate) struct Splices {
    items: Vec<(Range<usize>, String)>,
}

impl Splices {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn replace(&mut self, range: Range<usize>, with: impl Into<String>) {
        self.items.push((range, with.into()));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn apply(mut self, html: &str) -> String {
        if self.items.is_empty() {
            return html.to_owned();
        }
        // Stable sort keeps insertion order among equal starts.
        self.items.sort_by_key(|(range, _)| range.start);

        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;
        for (range, with) in self.items {
            if range.start < cursor {
                continue;
            }
            out.push_str(&html[cursor..range.start]);
            out.push_str(&with);
            cursor = range.end;
        }
        out.push_str(&html[cursor..]);
        out
    }
}

/// Elements of `html` outside restored capture regions, placeholders
/// themselves excluded.
pub(crate) fn editable_elements(html: &str) -> Vec<Element> {
    let protected = ProtectedRanges::of_class(html, PLACEHOLDER_CLASS);
    markup::scan_elements(html)
        .into_iter()
        .filter(|el| !protected.contains(el.outer.start) && !el.has_class(PLACEHOLDER_CLASS))
        .collect()
}

/// Open tag for `tag` with `attrs`, values escaped.
pub(crate) fn open_tag(tag: &str, attrs: &[(String, String)]) -> String {
    let mut out = format!("<{tag}");
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&markup::escape_attr(value));
        out.push('"');
    }
    out.push('>');
    out
}

/// Set `name` to `value`, replacing an existing value.
pub(crate) fn set_attr(attrs: &mut Vec<(String, String)>, name: &str, value: String) {
    match attrs.iter_mut().find(|(key, _)| key == name) {
        Some((_, existing)) => *existing = value,
        None => attrs.push((name.to_owned(), value)),
    }
}

/// Prepend `declarations` to the element's `style`, so existing
/// declarations win on conflict.
pub(crate) fn prepend_style(attrs: &mut Vec<(String, String)>, declarations: &str) {
    let existing = attrs
        .iter()
        .find(|(key, _)| key == "style")
        .map(|(_, value)| value.trim().to_owned())
        .unwrap_or_default();
    let merged = if existing.is_empty() {
        declarations.to_owned()
    } else {
        let mut merged = declarations.trim_end().to_owned();
        if !merged.ends_with(';') {
            merged.push(';');
        }
        merged.push_str(&existing);
        merged
    };
    set_attr(attrs, "style", merged);
}

/// Decode the entities the renderer emits.
pub(crate) fn unescape_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
