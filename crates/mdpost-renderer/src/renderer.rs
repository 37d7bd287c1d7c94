//! Markdown renderer with token rule dispatch.

use std::collections::HashMap;
use std::fmt::Write;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::html::{self, AlertKind};
use crate::rule::{RuleOutput, Token, TokenRule, parse_fence_info};
use crate::state::{CodeBlockState, HeadingState, ImageState, TableState, TocEntry, escape_html};
use crate::util::heading_level_to_num;

/// Result of rendering markdown.
#[derive(Clone, Debug, Default)]
pub struct RenderResult {
    /// Rendered HTML content.
    pub html: String,
    /// Title extracted from first H1 heading (if `extract_title` was enabled).
    pub title: Option<String>,
    /// Table of contents entries.
    pub toc: Vec<TocEntry>,
    /// Raw YAML front matter, without the `---` delimiters.
    pub front_matter: Option<String>,
    /// Warnings generated during conversion (e.g., failing token rules).
    pub warnings: Vec<String>,
}

/// Markdown renderer.
///
/// Constructs plugins may want to shape are offered as [`Token`]s to the
/// attached [`TokenRule`]s in attachment order. The first rule returning
/// [`RuleOutput::Html`] wins; a rule error is logged, recorded as a warning,
/// and the next rule is tried.
pub struct MarkdownRenderer<'r> {
    output: String,
    /// Footnote definitions being rendered, innermost last. Output goes to the
    /// innermost buffer while any is open.
    footnotes: Vec<(String, String)>,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    pending_attrs: HashMap<String, String>,
    rules: Vec<&'r mut dyn TokenRule>,
    code_block_index: usize,
    gfm: bool,
    front_matter: Option<String>,
    in_front_matter: bool,
    warnings: Vec<String>,
}

impl<'r> MarkdownRenderer<'r> {
    /// Create a new renderer with GFM enabled by default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            footnotes: Vec::new(),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::new(false),
            pending_image: None,
            pending_attrs: HashMap::new(),
            rules: Vec::new(),
            code_block_index: 0,
            gfm: true,
            front_matter: None,
            in_front_matter: false,
            warnings: Vec::new(),
        }
    }

    /// Enable title extraction from first H1 heading.
    ///
    /// The first H1 is reported as the title and left out of the table of
    /// contents, but still rendered.
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.heading = HeadingState::new(true);
        self
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    /// - Alerts (`> [!NOTE]`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Attach a token rule after the already attached ones.
    #[must_use]
    pub fn with_rule(mut self, rule: &'r mut dyn TokenRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Attach several token rules, keeping their order.
    #[must_use]
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = &'r mut dyn TokenRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Get parser options based on GFM configuration.
    ///
    /// Footnotes, math and YAML front matter are always on.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let base = Options::ENABLE_FOOTNOTES
            | Options::ENABLE_MATH
            | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
        if self.gfm {
            base | Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            base
        }
    }

    /// Create a configured parser for the given markdown text.
    #[must_use]
    pub fn create_parser<'a>(&self, markdown: &'a str) -> Parser<'a> {
        Parser::new_ext(markdown, self.parser_options())
    }

    /// Render markdown text directly using configured parser options.
    pub fn render_markdown(&mut self, markdown: &str) -> RenderResult {
        self.render(self.create_parser(markdown))
    }

    /// Render markdown events and return the result.
    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }

        // Unterminated footnote definitions cannot come from the parser, but a
        // hand-built event stream may leave one open.
        while let Some((_, body)) = self.footnotes.pop() {
            self.out().push_str(&body);
        }

        RenderResult {
            html: std::mem::take(&mut self.output),
            title: self.heading.take_title(),
            toc: self.heading.take_toc(),
            front_matter: self.front_matter.take(),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    /// Offer `token` to the attached rules in order.
    fn apply_rules(&mut self, token: &Token<'_>) -> Option<String> {
        for rule in &mut self.rules {
            match rule.render_token(token) {
                Ok(RuleOutput::Html(html)) => return Some(html),
                Ok(RuleOutput::PassThrough) => {}
                Err(e) => {
                    tracing::error!(rule = rule.name(), error = %e, "token rule failed");
                    self.warnings.push(format!("{}: {e}", rule.name()));
                }
            }
        }
        None
    }

    /// Current block-level output buffer.
    fn out(&mut self) -> &mut String {
        match self.footnotes.last_mut() {
            Some((_, body)) => body,
            None => &mut self.output,
        }
    }

    /// Push content to output or heading buffer based on context.
    fn push_inline(&mut self, content: &str) {
        if self.image.is_active() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.out().push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) => self.out().push_str(&html),
            Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak => self.push_inline("\n"),
            Event::HardBreak => self.push_inline("<br>"),
            Event::Rule => self.out().push_str("<hr>"),
            Event::TaskListMarker(checked) => html::task_list_marker(checked, self.out()),
            Event::InlineMath(tex) => self.math(&tex, false),
            Event::DisplayMath(tex) => self.math(&tex, true),
            Event::FootnoteReference(label) => self.footnote_reference(&label),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.code.is_active() {
                    self.out().push_str("<p>");
                }
            }
            Tag::Heading { level, .. } => {
                // Opening tag is written in end_tag after we have the ID.
                self.heading.start_heading(heading_level_to_num(level));
            }
            Tag::BlockQuote(kind) => match kind {
                Some(kind) => html::alert_start(AlertKind::from(kind), self.out()),
                None => self.out().push_str("<blockquote>"),
            },
            Tag::CodeBlock(kind) => {
                let (lang, attrs) = match kind {
                    CodeBlockKind::Fenced(ref info) if !info.is_empty() => {
                        let (lang, attrs) = parse_fence_info(info);
                        (if lang.is_empty() { None } else { Some(lang) }, attrs)
                    }
                    _ => (None, HashMap::new()),
                };
                self.pending_attrs = attrs;
                self.code.start(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.out().push_str("<ol>"),
                Some(n) => write!(self.out(), r#"<ol start="{n}">"#).unwrap(),
                None => self.out().push_str("<ul>"),
            },
            Tag::Item => self.out().push_str("<li>"),
            Tag::FootnoteDefinition(label) => {
                self.footnotes.push((label.to_string(), String::new()));
            }
            Tag::MetadataBlock(_) => {
                self.in_front_matter = true;
                self.front_matter = Some(String::new());
            }
            Tag::HtmlBlock => {}
            Tag::DefinitionList => self.out().push_str("<dl>"),
            Tag::DefinitionListTitle => self.out().push_str("<dt>"),
            Tag::DefinitionListDefinition => self.out().push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.out().push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.out().push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.out().push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.out(), "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Link { dest_url, .. } => {
                let link_tag = format!(r#"<a href="{}">"#, escape_html(&dest_url));
                self.push_inline(&link_tag);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Start collecting alt text; image will be rendered in end_tag
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if !self.code.is_active() {
                    self.out().push_str("</p>");
                }
            }
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.complete_heading() {
                    let token = Token::Heading {
                        level: heading.level,
                        id: &heading.id,
                        text: &heading.text,
                        html: &heading.html,
                    };
                    match self.apply_rules(&token) {
                        Some(html) => self.out().push_str(&html),
                        None => html::heading(heading.level, &heading.id, &heading.html, self.out()),
                    }
                }
            }
            TagEnd::BlockQuote(_) => self.out().push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                let (lang, content) = self.code.end();
                let attrs = std::mem::take(&mut self.pending_attrs);
                let index = self.code_block_index;
                self.code_block_index += 1;

                let token = Token::CodeBlock {
                    language: lang.as_deref(),
                    attrs: &attrs,
                    source: &content,
                    index,
                };
                match self.apply_rules(&token) {
                    Some(html) => self.out().push_str(&html),
                    None => html::code_block(lang.as_deref(), &content, self.out()),
                }
            }
            TagEnd::List(ordered) => {
                self.out().push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.out().push_str("</li>"),
            TagEnd::FootnoteDefinition => {
                if let Some((label, body)) = self.footnotes.pop() {
                    let token = Token::FootnoteDefinition {
                        label: &label,
                        html: &body,
                    };
                    match self.apply_rules(&token) {
                        Some(html) => self.out().push_str(&html),
                        None => html::footnote_definition(&label, &body, self.out()),
                    }
                }
            }
            TagEnd::MetadataBlock(_) => self.in_front_matter = false,
            TagEnd::HtmlBlock => {}
            TagEnd::Image => {
                // Render image with collected alt text
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let token = Token::Image {
                        src: &src,
                        alt: &alt,
                        title: &title,
                    };
                    let html = self.apply_rules(&token).unwrap_or_else(|| {
                        let mut html = String::new();
                        html::image(&src, &alt, &title, &mut html);
                        html
                    });
                    self.push_inline(&html);
                }
            }
            TagEnd::DefinitionList => self.out().push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.out().push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.out().push_str("</dd>"),
            TagEnd::Table => self.out().push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.out().push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.out().push_str("</tr>"),
            TagEnd::TableCell => {
                let close = if self.table.is_in_head() { "</th>" } else { "</td>" };
                self.out().push_str(close);
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_front_matter {
            if let Some(front_matter) = &mut self.front_matter {
                front_matter.push_str(text);
            }
        } else if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.out().push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        self.push_inline(&format!("<code>{}</code>", escape_html(code)));
    }

    fn math(&mut self, tex: &str, display: bool) {
        if self.image.is_active() {
            self.image.push_str(tex);
            return;
        }
        let token = Token::Math { tex, display };
        let html = self.apply_rules(&token).unwrap_or_else(|| {
            let mut html = String::new();
            html::math(tex, display, &mut html);
            html
        });
        self.push_inline(&html);
    }

    fn footnote_reference(&mut self, label: &str) {
        let token = Token::FootnoteReference { label };
        let html = self.apply_rules(&token).unwrap_or_else(|| {
            let mut html = String::new();
            html::footnote_reference(label, &mut html);
            html
        });
        self.push_inline(&html);
    }
}

impl Default for MarkdownRenderer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleError;
    use pretty_assertions::assert_eq;

    fn render_html(markdown: &str) -> RenderResult {
        MarkdownRenderer::new().render_markdown(markdown)
    }

    #[test]
    fn test_heading_and_paragraph() {
        let result = render_html("# Title\n\nHello");
        assert_eq!(result.html, r#"<h1 id="title">Title</h1><p>Hello</p>"#);
    }

    #[test]
    fn test_heading_with_id_and_toc() {
        let result = render_html("## Section Title");
        assert_eq!(result.html, r#"<h2 id="section-title">Section Title</h2>"#);
        assert_eq!(
            result.toc,
            vec![TocEntry {
                level: 2,
                title: "Section Title".to_owned(),
                id: "section-title".to_owned(),
            }]
        );
    }

    #[test]
    fn test_title_extraction() {
        let mut renderer = MarkdownRenderer::new().with_title_extraction();
        let result = renderer.render_markdown("# My Title\n\nSome content\n\n## Section");

        assert_eq!(result.title, Some("My Title".to_owned()));
        assert!(result.html.contains(r#"<h1 id="my-title">My Title</h1>"#));
        assert_eq!(result.toc.len(), 1);
        assert_eq!(result.toc[0].level, 2);
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let result = render_html("## FAQ\n\n## FAQ\n\n## FAQ");
        let ids: Vec<_> = result.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["faq", "faq-1", "faq-2"]);
    }

    #[test]
    fn test_heading_with_inline_code() {
        let result = render_html("## Install `npm`");
        assert!(result.html.contains("<code>npm</code>"));
        assert_eq!(result.toc[0].title, "Install npm");
    }

    #[test]
    fn test_code_block() {
        let result = render_html("```rust\nfn main() {}\n```");
        assert_eq!(
            result.html,
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_alert_and_blockquote() {
        let result = render_html("> [!NOTE]\n> This is a **note**.");
        assert!(result.html.contains("alert-note"));
        assert!(result.html.contains("<strong>note</strong>"));

        let result = render_html("> Just a regular quote");
        assert!(result.html.contains("<blockquote>"));
        assert!(!result.html.contains("alert"));
    }

    #[test]
    fn test_image() {
        let result = render_html("![Alt *text*](image.png \"Cap\")");
        assert_eq!(
            result.html,
            r#"<p><img src="image.png" title="Cap" alt="Alt text"></p>"#
        );
    }

    #[test]
    fn test_table() {
        let result = render_html("| A | B |\n|---|--:|\n| 1 | 2 |");
        assert_eq!(
            result.html,
            concat!(
                "<table><thead><tr><th>A</th><th style=\"text-align:right\">B</th></tr></thead>",
                "<tbody><tr><td>1</td><td style=\"text-align:right\">2</td></tr></tbody></table>"
            )
        );
    }

    #[test]
    fn test_gfm_disabled() {
        let mut renderer = MarkdownRenderer::new().with_gfm(false);
        let result = renderer.render_markdown("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(!result.html.contains("<table>"));
        assert!(!renderer.parser_options().contains(Options::ENABLE_TABLES));
        assert!(renderer.parser_options().contains(Options::ENABLE_FOOTNOTES));
    }

    #[test]
    fn test_task_list() {
        let result = render_html("- [ ] Open\n- [x] Done");
        assert!(result.html.contains(r#"<input type="checkbox" disabled>"#));
        assert!(result.html.contains(r#"<input type="checkbox" checked disabled>"#));
    }

    #[test]
    fn test_math() {
        let result = render_html("Inline $a^2$ here");
        assert_eq!(
            result.html,
            r#"<p>Inline <span class="math math-inline">a^2</span> here</p>"#
        );
    }

    #[test]
    fn test_footnotes() {
        let result = render_html("Text[^1].\n\n[^1]: The note.");
        assert!(result.html.contains(r##"<a href="#fn-1">[1]</a>"##));
        assert!(result.html.contains(
            r#"<div class="footnote-definition" id="fn-1"><sup>1</sup><p>The note.</p></div>"#
        ));
    }

    #[test]
    fn test_front_matter_collected() {
        let result = render_html("---\ntitle: Hello\nauthor: Me\n---\n\nBody");
        assert_eq!(result.html, "<p>Body</p>");
        let front_matter = result.front_matter.unwrap();
        assert!(front_matter.contains("title: Hello"));
        assert!(front_matter.contains("author: Me"));
    }

    #[test]
    fn test_no_front_matter() {
        assert_eq!(render_html("Body").front_matter, None);
    }

    struct CardRule {
        seen: Vec<usize>,
    }

    impl TokenRule for CardRule {
        fn name(&self) -> &str {
            "card"
        }

        fn render_token(&mut self, token: &Token<'_>) -> Result<RuleOutput, RuleError> {
            match token {
                Token::CodeBlock {
                    language: Some("card"),
                    source,
                    index,
                    ..
                } => {
                    self.seen.push(*index);
                    Ok(RuleOutput::Html(format!("<card>{}</card>", source.trim())))
                }
                _ => Ok(RuleOutput::PassThrough),
            }
        }
    }

    struct FailingRule;

    impl TokenRule for FailingRule {
        fn name(&self) -> &str {
            "broken"
        }

        fn render_token(&mut self, _token: &Token<'_>) -> Result<RuleOutput, RuleError> {
            Err(RuleError::new("boom"))
        }
    }

    struct UpperHeading;

    impl TokenRule for UpperHeading {
        fn name(&self) -> &str {
            "upper"
        }

        fn render_token(&mut self, token: &Token<'_>) -> Result<RuleOutput, RuleError> {
            if let Token::Heading { level, text, .. } = token {
                return Ok(RuleOutput::Html(format!(
                    "<h{level}>{}</h{level}>",
                    text.to_uppercase()
                )));
            }
            Ok(RuleOutput::PassThrough)
        }
    }

    #[test]
    fn test_rule_claims_code_block() {
        let mut card = CardRule { seen: Vec::new() };
        let result = MarkdownRenderer::new()
            .with_rule(&mut card)
            .render_markdown("```rust\nx\n```\n\n```card\nhello\n```");

        assert!(result.html.contains("<card>hello</card>"));
        assert!(result.html.contains(r#"class="language-rust""#));
        assert_eq!(card.seen, vec![1]);
    }

    #[test]
    fn test_first_rule_wins() {
        let mut upper = UpperHeading;
        let mut card = CardRule { seen: Vec::new() };
        let result = MarkdownRenderer::new()
            .with_rules([&mut upper as &mut dyn TokenRule, &mut card])
            .render_markdown("## Hi");
        assert_eq!(result.html, "<h2>HI</h2>");
    }

    #[test]
    fn test_failing_rule_falls_back_to_default() {
        let mut broken = FailingRule;
        let mut upper = UpperHeading;
        let result = MarkdownRenderer::new()
            .with_rules([&mut broken as &mut dyn TokenRule, &mut upper])
            .render_markdown("## Hi\n\nText");

        assert_eq!(result.html, "<h2>HI</h2><p>Text</p>");
        assert_eq!(result.warnings, vec!["broken: boom".to_owned()]);
    }

    #[test]
    fn test_failing_rule_alone_renders_default() {
        let mut broken = FailingRule;
        let result = MarkdownRenderer::new()
            .with_rule(&mut broken)
            .render_markdown("`x` and $y$");
        assert!(result.html.contains(r#"<span class="math math-inline">y</span>"#));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_default_renderer() {
        let parser = Parser::new("Hello");
        let result = MarkdownRenderer::default().render(parser);
        assert_eq!(result.html, "<p>Hello</p>");
    }
}
