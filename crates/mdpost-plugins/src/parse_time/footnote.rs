//! Footnotes collected into a numbered notes section.

use std::collections::HashMap;
use std::fmt::Write;

use async_trait::async_trait;
use mdpost_config::{ConfigMap, ConfigValue, MetaConfig};
use mdpost_pipeline::{HookContext, ParseTimePlugin, PluginError};
use mdpost_renderer::{RuleError, RuleOutput, Token, TokenRule, escape_html};

use crate::splice::{Splices, editable_elements};

const TITLE_KEY: &str = "title";
const LINKS_AS_NOTES_KEY: &str = "linksAsNotes";
const DEFAULT_TITLE: &str = "References";

#[derive(Debug)]
struct Note {
    number: usize,
    html: String,
}

/// Numbers footnote references by first use and gathers every note into a
/// section at the end of the document.
///
/// Target platforms strip in-page anchors, so references are plain `[n]`
/// markers. With `linksAsNotes` on, external links are turned into notes too.
#[derive(Debug, Default)]
pub struct FootnotePlugin {
    title: String,
    links_as_notes: bool,
    numbers: HashMap<String, usize>,
    definitions: HashMap<String, String>,
}

impl FootnotePlugin {
    pub const NAME: &'static str = "footnote";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn number_of(&mut self, label: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(label.to_owned()).or_insert(next)
    }

    /// Referenced definitions in reference order, then unreferenced ones.
    fn take_notes(&mut self) -> Vec<Note> {
        let mut definitions: Vec<(String, String)> = self.definitions.drain().collect();
        definitions.sort_by(|a, b| a.0.cmp(&b.0));

        let mut notes = Vec::new();
        let mut orphans = Vec::new();
        for (label, html) in definitions {
            match self.numbers.get(&label) {
                Some(&number) => notes.push(Note { number, html }),
                None => orphans.push(html),
            }
        }
        notes.sort_by_key(|note| note.number);

        let mut next = self.numbers.len() + 1;
        for html in orphans {
            notes.push(Note { number: next, html });
            next += 1;
        }
        notes
    }

    /// Replace external links with their text plus a note marker.
    fn links_to_notes(&self, html: &str, first: usize, notes: &mut Vec<Note>) -> String {
        let mut splices = Splices::new();
        let mut number = first;
        for el in editable_elements(html) {
            if el.tag != "a" {
                continue;
            }
            let Some(href) = el.attr("href") else { continue };
            if !(href.starts_with("http://") || href.starts_with("https://")) {
                continue;
            }
            let text = &html[el.inner.clone()];
            splices.replace(el.outer.clone(), format!("{text}{}", marker(number)));
            notes.push(Note {
                number,
                html: format!("{text}: <em>{}</em>", escape_html(href)),
            });
            number += 1;
        }
        splices.apply(html)
    }
}

fn marker(number: usize) -> String {
    format!(r#"<sup class="footnote-ref">[{number}]</sup>"#)
}

/// Unwrap a body that is a single paragraph.
fn inline_body(html: &str) -> &str {
    let trimmed = html.trim();
    match trimmed
        .strip_prefix("<p>")
        .and_then(|rest| rest.strip_suffix("</p>"))
    {
        Some(inner) if !inner.contains("<p>") => inner,
        _ => trimmed,
    }
}

impl TokenRule for FootnotePlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render_token(&mut self, token: &Token<'_>) -> Result<RuleOutput, RuleError> {
        match *token {
            Token::FootnoteReference { label } => {
                let number = self.number_of(label);
                Ok(RuleOutput::Html(marker(number)))
            }
            Token::FootnoteDefinition { label, html } => {
                self.definitions
                    .insert(label.to_owned(), inline_body(html).to_owned());
                Ok(RuleOutput::Html(String::new()))
            }
            _ => Ok(RuleOutput::PassThrough),
        }
    }
}

#[async_trait]
impl ParseTimePlugin for FootnotePlugin {
    fn meta_config(&self) -> MetaConfig {
        MetaConfig::new()
            .input(TITLE_KEY, "Notes section title")
            .switch(LINKS_AS_NOTES_KEY, "Turn external links into notes")
    }

    fn default_config(&self) -> ConfigMap {
        ConfigMap::from([
            (TITLE_KEY.to_owned(), ConfigValue::from(DEFAULT_TITLE)),
            (LINKS_AS_NOTES_KEY.to_owned(), ConfigValue::from(false)),
        ])
    }

    async fn prepare(&mut self, ctx: &HookContext<'_>) -> Result<(), PluginError> {
        self.title = ctx.config.str_or(TITLE_KEY, DEFAULT_TITLE).to_owned();
        self.links_as_notes = ctx.config.bool_or(LINKS_AS_NOTES_KEY, false);
        self.numbers.clear();
        self.definitions.clear();
        Ok(())
    }

    async fn postprocess(&mut self, html: &str, _ctx: &HookContext<'_>) -> Result<String, PluginError> {
        let mut notes = self.take_notes();
        let html = if self.links_as_notes {
            self.links_to_notes(html, notes.len() + 1, &mut notes)
        } else {
            html.to_owned()
        };
        if notes.is_empty() {
            return Ok(html);
        }

        let mut out = html;
        out.push_str(r#"<section class="footnotes">"#);
        if !self.title.is_empty() {
            write!(
                out,
                r#"<h4 class="footnotes-title">{}</h4>"#,
                escape_html(&self.title)
            )
            .unwrap();
        }
        for note in notes {
            write!(
                out,
                r#"<p class="footnote-item"><span class="footnote-num">[{}]</span> {}</p>"#,
                note.number, note.html
            )
            .unwrap();
        }
        out.push_str("</section>");
        Ok(out)
    }
}
