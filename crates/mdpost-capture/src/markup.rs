//! Lightweight HTML element index.
//!
//! Builds a flat list of element spans (byte ranges of the whole element and of
//! its inner content) from an HTML string, matching open and close tags with a
//! stack. Void elements and self-closing tags produce empty inner ranges.
//! Raw-text elements (`script`, `style`, `textarea`) are skipped as opaque.
//! Unclosed elements end where their parent ends; stray close tags are
//! ignored.
//!
//! The index never rewrites the input, so callers can splice the original
//! string by range and keep every byte outside the touched spans.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Tags and comments. Group 1 marks a close tag, group 2 is the tag name,
/// group 3 the raw attribute text.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!--[\s\S]*?-->|<(/)?([A-Za-z][A-Za-z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
        .expect("invalid tag regex")
});

static ATTR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("invalid attribute regex")
});

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

/// One element located in an HTML string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes in source order, values entity-decoded.
    pub attrs: Vec<(String, String)>,
    /// Byte range from `<tag` through the close tag.
    pub outer: Range<usize>,
    /// Byte range of the content between open and close tag.
    pub inner: Range<usize>,
    /// Byte range of the open tag.
    pub open_tag: Range<usize>,
    /// Nesting depth, 0 for top-level elements.
    pub depth: usize,
}

impl Element {
    /// Value of attribute `name`, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the `class` attribute contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

struct OpenElement {
    tag: String,
    attrs: Vec<(String, String)>,
    open_tag: Range<usize>,
    depth: usize,
}

impl OpenElement {
    fn close(self, inner_end: usize, outer_end: usize) -> Element {
        Element {
            inner: self.open_tag.end..inner_end,
            outer: self.open_tag.start..outer_end,
            tag: self.tag,
            attrs: self.attrs,
            open_tag: self.open_tag,
            depth: self.depth,
        }
    }
}

/// Index every element of `html`, ordered by start offset.
#[must_use]
pub fn scan_elements(html: &str) -> Vec<Element> {
    let mut open: Vec<OpenElement> = Vec::new();
    let mut elements = Vec::new();
    let mut raw_text: Option<String> = None;

    for caps in TAG_PATTERN.captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        // Comments have no tag name.
        let Some(name) = caps.get(2) else { continue };
        let tag = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some();

        if let Some(raw) = &raw_text {
            if !(closing && *raw == tag) {
                continue;
            }
            raw_text = None;
        }

        if closing {
            let Some(pos) = open.iter().rposition(|el| el.tag == tag) else {
                continue;
            };
            for unclosed in open.split_off(pos + 1).into_iter().rev() {
                elements.push(unclosed.close(whole.start(), whole.start()));
            }
            if let Some(matched) = open.pop() {
                elements.push(matched.close(whole.start(), whole.end()));
            }
            continue;
        }

        let raw_attrs = caps.get(3).map_or("", |m| m.as_str()).trim_end();
        let self_closing = raw_attrs.ends_with('/');
        let attrs = parse_attributes(raw_attrs.trim_end_matches('/'));
        let element = OpenElement {
            tag,
            attrs,
            open_tag: whole.range(),
            depth: open.len(),
        };

        if self_closing || VOID_ELEMENTS.contains(&element.tag.as_str()) {
            elements.push(element.close(whole.end(), whole.end()));
        } else {
            if RAW_TEXT_ELEMENTS.contains(&element.tag.as_str()) {
                raw_text = Some(element.tag.clone());
            }
            open.push(element);
        }
    }

    for unclosed in open.into_iter().rev() {
        elements.push(unclosed.close(html.len(), html.len()));
    }

    elements.sort_by_key(|el| (el.outer.start, el.depth));
    elements
}

/// Parse the attribute text of an open tag.
#[must_use]
pub fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTR_PATTERN
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or(String::new(), |m| unescape_attr(m.as_str()));
            Some((name, value))
        })
        .collect()
}

/// Escape a string for use inside a double-quoted attribute value.
#[must_use]
pub fn escape_attr(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

fn unescape_attr(value: &str) -> String {
    if !value.contains('&') {
        return value.to_owned();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Byte ranges whose content must not be modified, sorted and non-overlapping.
#[derive(Clone, Debug, Default)]
pub struct ProtectedRanges(Vec<Range<usize>>);

impl ProtectedRanges {
    /// Inner ranges of every element carrying `class`, outermost only.
    #[must_use]
    pub fn of_class(html: &str, class: &str) -> Self {
        let mut ranges: Vec<Range<usize>> = Vec::new();
        for element in scan_elements(html) {
            if !element.has_class(class) {
                continue;
            }
            if ranges.last().is_some_and(|last| element.outer.start < last.end) {
                continue;
            }
            ranges.push(element.inner);
        }
        Self(ranges)
    }

    /// Whether byte offset `pos` lies inside a protected range.
    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        let idx = self.0.partition_point(|range| range.end <= pos);
        self.0.get(idx).is_some_and(|range| range.contains(&pos))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
