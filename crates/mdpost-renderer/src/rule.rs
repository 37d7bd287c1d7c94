//! Token rules: the extension point of the parse engine.
//!
//! The renderer walks parser events and, for each construct plugins may want
//! to shape, builds a [`Token`] and offers it to every attached [`TokenRule`]
//! in order. The first rule returning [`RuleOutput::Html`] wins; if all pass,
//! the default HTML is emitted.
//!
//! A rule returning `Err` is logged and skipped, so a broken rule degrades to
//! default rendering instead of aborting the parse.

use std::collections::HashMap;

/// A construct offered to token rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// A completed heading with its unique anchor id.
    Heading {
        level: u8,
        id: &'a str,
        /// Plain text content.
        text: &'a str,
        /// Rendered inline HTML content.
        html: &'a str,
    },
    /// A fenced or indented code block.
    CodeBlock {
        /// First word of the fence info string.
        language: Option<&'a str>,
        /// `key=value` pairs following the language.
        attrs: &'a HashMap<String, String>,
        source: &'a str,
        /// Zero-based index among the document's code blocks.
        index: usize,
    },
    Image {
        src: &'a str,
        alt: &'a str,
        title: &'a str,
    },
    /// `$...$` (inline) or `$$...$$` (display) math.
    Math { tex: &'a str, display: bool },
    FootnoteReference { label: &'a str },
    /// A footnote definition with its rendered body.
    FootnoteDefinition { label: &'a str, html: &'a str },
}

/// Result of offering a token to a rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleOutput {
    /// Emit this HTML in place of the default rendering.
    Html(String),
    /// Not handled; try the next rule.
    PassThrough,
}

/// Failure inside a token rule.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RuleError {
    message: String,
}

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A token-level rendering rule.
pub trait TokenRule {
    /// Name used in logs and warnings.
    fn name(&self) -> &str;

    /// Render `token`, or pass it on.
    ///
    /// Default implementation passes every token.
    fn render_token(&mut self, token: &Token<'_>) -> Result<RuleOutput, RuleError> {
        let _ = token;
        Ok(RuleOutput::PassThrough)
    }
}

/// Parse fence info string into language and attributes.
///
/// Format: `language [key=value ...]`. Quotes around values are stripped;
/// values cannot contain whitespace.
#[must_use]
pub fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let mut parts = info.split_whitespace();
    let language = parts.next().unwrap_or("").to_owned();

    let mut attrs = HashMap::new();
    for part in parts {
        if let Some((key, value)) = part.split_once('=') {
            let value = value.trim_matches('"').trim_matches('\'');
            attrs.insert(key.to_owned(), value.to_owned());
        }
    }

    (language, attrs)
}
