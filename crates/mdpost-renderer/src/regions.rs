//! Code regions of Markdown source, for source pre-passes.
//!
//! Pre-pass plugins rewrite Markdown before the engine sees it and must leave
//! code alone. Regions come from the same parser the engine uses, so fences
//! nested in blockquotes and list items, indented code blocks and inline code
//! spans are found exactly where rendering will find them.

use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, Tag};

fn scan_options() -> Options {
    Options::ENABLE_FOOTNOTES
        | Options::ENABLE_MATH
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
        | Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
}

/// Byte ranges of code blocks, inline code spans and front matter.
///
/// Sorted and non-overlapping. An unterminated fence runs to the end of its
/// container, as CommonMark specifies.
#[must_use]
pub fn code_ranges(source: &str) -> Vec<Range<usize>> {
    let mut found: Vec<Range<usize>> = Parser::new_ext(source, scan_options())
        .into_offset_iter()
        .filter(|(event, _)| {
            matches!(
                event,
                Event::Code(_) | Event::Start(Tag::CodeBlock(_) | Tag::MetadataBlock(_))
            )
        })
        .map(|(_, range)| range)
        .collect();
    found.sort_by_key(|range| range.start);

    let mut ranges: Vec<Range<usize>> = Vec::with_capacity(found.len());
    for range in found {
        match ranges.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => ranges.push(range),
        }
    }
    ranges
}

/// Byte ranges of `source` outside [`code_ranges`].
#[must_use]
pub fn prose_ranges(source: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut cursor = 0;
    for code in code_ranges(source) {
        if cursor < code.start {
            ranges.push(cursor..code.start);
        }
        cursor = cursor.max(code.end);
    }
    if cursor < source.len() {
        ranges.push(cursor..source.len());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn prose(source: &str) -> String {
        prose_ranges(source)
            .into_iter()
            .map(|range| &source[range])
            .collect()
    }

    #[test]
    fn test_fenced_block_excluded() {
        let text = prose("a\n\n```\n![[x]]\n```\n\nc\n");
        assert!(!text.contains("![[x]]"));
        assert!(text.starts_with("a\n"));
        assert!(text.ends_with("c\n"));
    }

    #[test]
    fn test_inline_code_excluded() {
        let source = "see `![[x.png]]` and ![[y.png]]";
        let text = prose(source);
        assert_eq!(text, "see  and ![[y.png]]");
        assert_eq!(code_ranges(source), vec![4..16]);
    }

    #[test]
    fn test_fence_in_blockquote_excluded() {
        let text = prose("> ```\n> ![[x]]\n> ```\n\nafter\n");
        assert!(!text.contains("![[x]]"));
        assert!(text.contains("after"));
    }

    #[test]
    fn test_fence_in_list_item_excluded() {
        let text = prose("- item\n\n  ```\n  ![[x]]\n  ```\n");
        assert!(!text.contains("![[x]]"));
        assert!(text.contains("item"));
    }

    #[test]
    fn test_deeply_indented_fence_is_not_a_fence() {
        let source = "para\n\n    ```\n\n![[x]]\n";
        let text = prose(source);
        assert!(text.contains("![[x]]"));
        assert!(!text.contains("```"));
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let text = prose("intro\n\n~~~\nrest");
        assert!(text.contains("intro"));
        assert!(!text.contains("rest"));
    }

    #[test]
    fn test_plain_text_is_all_prose() {
        let source = "no code here\n";
        assert_eq!(prose_ranges(source), vec![0..source.len()]);
        assert!(code_ranges(source).is_empty());
    }
}
