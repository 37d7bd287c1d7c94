//! Default HTML for constructs no token rule claimed.

use std::fmt::Write;

use pulldown_cmark::BlockQuoteKind;

use crate::state::escape_html;

/// GitHub-style alert kinds (`> [!NOTE]` and friends).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    Note,
    Tip,
    Important,
    Warning,
    Caution,
}

impl From<BlockQuoteKind> for AlertKind {
    fn from(kind: BlockQuoteKind) -> Self {
        match kind {
            BlockQuoteKind::Note => Self::Note,
            BlockQuoteKind::Tip => Self::Tip,
            BlockQuoteKind::Important => Self::Important,
            BlockQuoteKind::Warning => Self::Warning,
            BlockQuoteKind::Caution => Self::Caution,
        }
    }
}

pub(crate) fn heading(level: u8, id: &str, html: &str, out: &mut String) {
    write!(out, r#"<h{level} id="{}">{html}</h{level}>"#, escape_html(id)).unwrap();
}

pub(crate) fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
    if let Some(lang) = lang {
        write!(
            out,
            r#"<pre><code class="language-{}">{}</code></pre>"#,
            escape_html(lang),
            escape_html(content)
        )
        .unwrap();
    } else {
        write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap();
    }
}

pub(crate) fn alert_start(kind: AlertKind, out: &mut String) {
    let (class, title) = match kind {
        AlertKind::Note => ("note", "Note"),
        AlertKind::Tip => ("tip", "Tip"),
        AlertKind::Important => ("important", "Important"),
        AlertKind::Warning => ("warning", "Warning"),
        AlertKind::Caution => ("caution", "Caution"),
    };
    write!(
        out,
        r#"<blockquote class="alert alert-{class}"><p class="alert-title">{title}</p>"#
    )
    .unwrap();
}

pub(crate) fn image(src: &str, alt: &str, title: &str, out: &mut String) {
    let title_attr = if title.is_empty() {
        String::new()
    } else {
        format!(r#" title="{}""#, escape_html(title))
    };
    write!(
        out,
        r#"<img src="{}"{title_attr} alt="{}">"#,
        escape_html(src),
        escape_html(alt)
    )
    .unwrap();
}

pub(crate) fn math(tex: &str, display: bool, out: &mut String) {
    let class = if display { "math math-display" } else { "math math-inline" };
    write!(out, r#"<span class="{class}">{}</span>"#, escape_html(tex)).unwrap();
}

pub(crate) fn footnote_reference(label: &str, out: &mut String) {
    let label = escape_html(label);
    write!(
        out,
        r##"<sup class="footnote-ref"><a href="#fn-{label}">[{label}]</a></sup>"##
    )
    .unwrap();
}

pub(crate) fn footnote_definition(label: &str, html: &str, out: &mut String) {
    let label = escape_html(label);
    write!(
        out,
        r#"<div class="footnote-definition" id="fn-{label}"><sup>{label}</sup>{html}</div>"#
    )
    .unwrap();
}

pub(crate) fn task_list_marker(checked: bool, out: &mut String) {
    if checked {
        out.push_str(r#"<input type="checkbox" checked disabled> "#);
    } else {
        out.push_str(r#"<input type="checkbox" disabled> "#);
    }
}
