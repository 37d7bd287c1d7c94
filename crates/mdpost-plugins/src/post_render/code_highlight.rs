//! Code block highlighting with `hljs-*` token spans.
//!
//! Blocks are parsed with the bundled syntect grammars and the resulting
//! scopes are mapped onto the small class set the inline palettes style.

use std::fmt::Write;
use std::ops::Range;
use std::sync::LazyLock;

use mdpost_config::{ConfigMap, ConfigValue, MetaConfig};
use mdpost_pipeline::{PluginError, PostRenderPlugin, ProcessContext};
use mdpost_renderer::escape_html;
use syntect::parsing::{ParseState, Scope, ScopeStack, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::splice::{Splices, editable_elements, unescape_html};

const LINE_NUMBERS_KEY: &str = "lineNumbers";
const MAC_STYLE_KEY: &str = "macStyle";
const PRESERVE_WHITESPACE_KEY: &str = "preserveWhitespace";

const MAC_DOTS: &str = concat!(
    r#"<span class="mac-dots" style="display:block;padding:10px 12px 0;">"#,
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="45" height="13" viewBox="0 0 450 130">"#,
    r##"<ellipse cx="50" cy="65" rx="50" ry="52" fill="#ff5f56"/>"##,
    r##"<ellipse cx="225" cy="65" rx="50" ry="52" fill="#ffbd2e"/>"##,
    r##"<ellipse cx="400" cy="65" rx="50" ry="52" fill="#27c93f"/>"##,
    "</svg></span>"
);

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Scope prefix to class, most specific first. `None` stops the lookup
/// without styling, so operators never pick up the keyword colour.
static SCOPE_CLASSES: LazyLock<Vec<(Scope, Option<&'static str>)>> = LazyLock::new(|| {
    [
        ("comment", Some("hljs-comment")),
        ("string", Some("hljs-string")),
        ("constant.numeric", Some("hljs-number")),
        ("constant.language", Some("hljs-literal")),
        ("variable.language", Some("hljs-keyword")),
        ("keyword.operator", None),
        ("keyword", Some("hljs-keyword")),
        ("storage", Some("hljs-keyword")),
        ("entity.name.function", Some("hljs-title")),
        ("support.function", Some("hljs-title")),
        ("entity.name.type", Some("hljs-type")),
        ("entity.name.class", Some("hljs-type")),
        ("entity.name.struct", Some("hljs-type")),
        ("support.type", Some("hljs-type")),
        ("support.class", Some("hljs-type")),
    ]
    .into_iter()
    .map(|(scope, class)| (Scope::new(scope).expect("invalid scope name"), class))
    .collect()
});

/// Grammar for a fence language. Names the bundled set lacks fall back to a
/// close relative.
fn syntax_for(language: &str) -> Option<&'static SyntaxReference> {
    let language = language.to_ascii_lowercase();
    let token = match language.as_str() {
        "python" => "py",
        "golang" => "go",
        "csharp" | "c#" => "cs",
        "c++" => "cpp",
        "objective-c" | "objc" => "m",
        "yml" => "yaml",
        "ruby" => "rb",
        "javascript" | "typescript" | "ts" | "tsx" | "jsx" => "js",
        "scss" | "sass" => "css",
        "kotlin" | "kt" => "java",
        "rust" => "rs",
        "shell" | "bash" | "zsh" | "console" | "dockerfile" => "sh",
        other => other,
    };
    SYNTAXES
        .find_syntax_by_token(token)
        .filter(|syntax| syntax.name != "Plain Text")
}

fn class_of(stack: &ScopeStack) -> Option<&'static str> {
    for scope in stack.as_slice().iter().rev() {
        if let Some((_, class)) = SCOPE_CLASSES
            .iter()
            .find(|(prefix, _)| prefix.is_prefix_of(*scope))
        {
            return *class;
        }
    }
    None
}

/// Split `code` into `(class, text)` runs; plain text has no class.
/// Neighbouring runs of the same class are merged.
fn tokenize<'a>(
    code: &'a str,
    syntax: &SyntaxReference,
) -> Result<Vec<(Option<&'static str>, &'a str)>, String> {
    let mut state = ParseState::new(syntax);
    let mut stack = ScopeStack::new();
    let mut runs: Vec<(Option<&'static str>, Range<usize>)> = Vec::new();

    let mut push = |class: Option<&'static str>, range: Range<usize>| {
        if range.is_empty() {
            return;
        }
        match runs.last_mut() {
            Some((last, previous)) if *last == class && previous.end == range.start => {
                previous.end = range.end;
            }
            _ => runs.push((class, range)),
        }
    };

    let mut line_start = 0;
    for line in LinesWithEndings::from(code) {
        let ops = state
            .parse_line(line, &SYNTAXES)
            .map_err(|e| e.to_string())?;
        let mut cursor = 0;
        for (offset, op) in ops {
            push(class_of(&stack), line_start + cursor..line_start + offset);
            stack.apply(&op).map_err(|e| e.to_string())?;
            cursor = offset;
        }
        push(class_of(&stack), line_start + cursor..line_start + line.len());
        line_start += line.len();
    }

    Ok(runs
        .into_iter()
        .map(|(class, range)| (class, &code[range]))
        .collect())
}

/// Accumulates highlighted output line by line, so spans never cross a
/// line break.
struct LineWriter {
    lines: Vec<String>,
    current: String,
    preserve_whitespace: bool,
}

impl LineWriter {
    fn new(preserve_whitespace: bool) -> Self {
        Self {
            lines: Vec::new(),
            current: String::new(),
            preserve_whitespace,
        }
    }

    fn push(&mut self, class: Option<&str>, text: &str) {
        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                self.lines.push(std::mem::take(&mut self.current));
            }
            if piece.is_empty() {
                continue;
            }
            let mut escaped = escape_html(piece);
            if self.preserve_whitespace {
                escaped = escaped.replace('\t', "    ").replace(' ', "&nbsp;");
            }
            match class {
                Some(class) => {
                    write!(self.current, r#"<span class="{class}">{escaped}</span>"#).unwrap();
                }
                None => self.current.push_str(&escaped),
            }
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.lines.push(self.current);
        self.lines
    }
}

#[derive(Clone, Copy, Debug)]
struct Options {
    line_numbers: bool,
    mac_style: bool,
    preserve_whitespace: bool,
}

fn highlight_block(language: Option<&str>, code: &str, options: Options) -> String {
    let code = code.strip_suffix('\n').unwrap_or(code);
    let runs = match language.and_then(syntax_for) {
        Some(syntax) => tokenize(code, syntax).unwrap_or_else(|e| {
            tracing::warn!(
                language = %syntax.name,
                error = %e,
                "highlighting failed, emitting plain code"
            );
            vec![(None, code)]
        }),
        None => vec![(None, code)],
    };

    let mut writer = LineWriter::new(options.preserve_whitespace);
    for (class, text) in runs {
        writer.push(class, text);
    }
    let lines = writer.finish();

    let separator = if options.preserve_whitespace { "<br>" } else { "\n" };
    let body = if options.line_numbers {
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                format!(
                    r#"<span class="code-line"><span class="line-number">{}</span>{line}</span>"#,
                    i + 1
                )
            })
            .collect::<Vec<_>>()
            .join(separator)
    } else {
        lines.join(separator)
    };

    let mut out = String::from(r#"<pre class="hljs code-block"#);
    if options.mac_style {
        out.push_str(" mac");
    }
    out.push('"');
    if let Some(language) = language {
        write!(out, r#" data-lang="{}""#, escape_html(language)).unwrap();
    }
    out.push('>');
    if options.mac_style {
        out.push_str(MAC_DOTS);
    }
    match language {
        Some(language) => write!(
            out,
            r#"<code class="hljs language-{}">"#,
            escape_html(language)
        )
        .unwrap(),
        None => out.push_str(r#"<code class="hljs">"#),
    }
    out.push_str(&body);
    out.push_str("</code></pre>");
    out
}

/// Highlights `<pre><code>` blocks and makes their layout survive platforms
/// that collapse whitespace.
#[derive(Debug, Default)]
pub struct CodeHighlightPlugin;

impl CodeHighlightPlugin {
    pub const NAME: &'static str = "code-highlight";

    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PostRenderPlugin for CodeHighlightPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta_config(&self) -> MetaConfig {
        MetaConfig::new()
            .switch(LINE_NUMBERS_KEY, "Show line numbers")
            .switch(MAC_STYLE_KEY, "Mac window style")
            .switch(PRESERVE_WHITESPACE_KEY, "Preserve indentation")
    }

    fn default_config(&self) -> ConfigMap {
        ConfigMap::from([
            (LINE_NUMBERS_KEY.to_owned(), ConfigValue::from(false)),
            (MAC_STYLE_KEY.to_owned(), ConfigValue::from(true)),
            (PRESERVE_WHITESPACE_KEY.to_owned(), ConfigValue::from(true)),
        ])
    }

    fn process(&self, html: &str, ctx: &ProcessContext<'_>) -> Result<String, PluginError> {
        let options = Options {
            line_numbers: ctx.config.bool_or(LINE_NUMBERS_KEY, false),
            mac_style: ctx.config.bool_or(MAC_STYLE_KEY, true),
            preserve_whitespace: ctx.config.bool_or(PRESERVE_WHITESPACE_KEY, true),
        };

        let elements = editable_elements(html);
        let mut splices = Splices::new();
        for (i, pre) in elements.iter().enumerate() {
            if pre.tag != "pre" || pre.has_class("hljs") {
                continue;
            }
            let Some(code) = elements.get(i + 1) else { continue };
            if code.tag != "code" || code.depth != pre.depth + 1 || code.outer.end > pre.inner.end {
                continue;
            }

            let language = code
                .attr("class")
                .unwrap_or_default()
                .split_whitespace()
                .find_map(|class| class.strip_prefix("language-"))
                .filter(|language| !language.is_empty());
            let source = unescape_html(&html[code.inner.clone()]);
            splices.replace(
                pre.outer.clone(),
                highlight_block(language, &source, options),
            );
        }

        if splices.is_empty() {
            return Ok(html.to_owned());
        }
        Ok(splices.apply(html))
    }
}
