//! Handlebars-backed template application.

use std::collections::BTreeMap;

use handlebars::Handlebars;
use serde_json::{Map, Value};

use crate::TemplateError;
use crate::source::TemplateSource;

/// Context key holding the article HTML.
pub const CONTENT_KEY: &str = "content";

/// Conventional list field iterated by templates.
pub const EPIGRAPH_KEY: &str = "epigraph";

/// Single entry used when the document supplies no epigraph list.
pub const EPIGRAPH_PLACEHOLDER: &str = "Write what you think, then think about what you wrote.";

/// Wraps article HTML in named templates.
///
/// Templates are fetched from the source and compiled on first use, then
/// cached until [`reload`](Self::reload). Metadata values are HTML-escaped;
/// templates insert the already rendered body with `{{{content}}}`.
pub struct TemplateEngine {
    source: Box<dyn TemplateSource>,
    handlebars: Handlebars<'static>,
    /// Templates that failed to compile, with the error kept for `apply`.
    broken: BTreeMap<String, String>,
    loaded: bool,
}

impl TemplateEngine {
    #[must_use]
    pub fn new(source: impl TemplateSource + 'static) -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);

        Self {
            source: Box::new(source),
            handlebars,
            broken: BTreeMap::new(),
            loaded: false,
        }
    }

    /// Wrap `content` in template `name`.
    ///
    /// An empty or unknown name returns `content` unchanged; unknown names
    /// are logged. The render context is `metadata` plus `content`, which
    /// wins on key collision, and an `epigraph` list defaulted to a single
    /// placeholder entry when absent or not an array.
    pub fn apply(
        &mut self,
        content: &str,
        name: &str,
        metadata: &Map<String, Value>,
    ) -> Result<String, TemplateError> {
        if name.is_empty() {
            return Ok(content.to_owned());
        }
        self.ensure_loaded();

        if let Some(message) = self.broken.get(name) {
            return Err(TemplateError::Compile {
                name: name.to_owned(),
                message: message.clone(),
            });
        }
        if !self.handlebars.has_template(name) {
            tracing::warn!(template = name, "template not found, returning content unwrapped");
            return Ok(content.to_owned());
        }

        let context = build_context(content, metadata);
        self.handlebars
            .render(name, &context)
            .map_err(|e| TemplateError::Render {
                name: name.to_owned(),
                source: Box::new(e),
            })
    }

    /// Whether template `name` is available and compiled.
    pub fn has_template(&mut self, name: &str) -> bool {
        self.ensure_loaded();
        self.handlebars.has_template(name)
    }

    /// Names of the compiled templates.
    pub fn template_names(&mut self) -> Vec<String> {
        self.ensure_loaded();
        let mut names: Vec<String> = self.handlebars.get_templates().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop compiled templates; the next use reads the source again.
    pub fn reload(&mut self) {
        self.handlebars.clear_templates();
        self.broken.clear();
        self.loaded = false;
    }

    fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;

        let templates = match self.source.load_all() {
            Ok(templates) => templates,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load templates, none available");
                return;
            }
        };

        for (name, text) in templates {
            if let Err(e) = self.handlebars.register_template_string(&name, text) {
                tracing::warn!(template = %name, error = %e, "template failed to compile");
                self.broken.insert(name, e.to_string());
            }
        }
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("loaded", &self.loaded)
            .field("broken", &self.broken.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn build_context(content: &str, metadata: &Map<String, Value>) -> Map<String, Value> {
    let mut context = metadata.clone();
    if !context.get(EPIGRAPH_KEY).is_some_and(Value::is_array) {
        context.insert(
            EPIGRAPH_KEY.to_owned(),
            Value::Array(vec![Value::String(EPIGRAPH_PLACEHOLDER.to_owned())]),
        );
    }
    context.insert(CONTENT_KEY.to_owned(), Value::String(content.to_owned()));
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DirTemplateSource, MemoryTemplateSource};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn meta(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("metadata must be an object"),
        }
    }

    fn engine() -> TemplateEngine {
        TemplateEngine::new(
            MemoryTemplateSource::new()
                .with_template("article", "<h1>{{title}}</h1><article>{{{content}}}</article>")
                .with_template(
                    "quotes",
                    "{{#each epigraph}}<blockquote>{{this}}</blockquote>{{/each}}{{{content}}}",
                )
                .with_template("broken", "{{#each items}}{{/if}}"),
        )
    }

    #[test]
    fn test_missing_template_returns_content_exactly() {
        let mut engine = engine();
        let content = "<p>a &amp; b</p>";
        let result = engine
            .apply(content, "missing-template", &meta(json!({"title": "T"})))
            .unwrap();
        assert_eq!(result, content);
    }

    #[test]
    fn test_empty_name_returns_content() {
        let mut engine = engine();
        assert_eq!(engine.apply("<p>x</p>", "", &Map::new()).unwrap(), "<p>x</p>");
    }

    #[test]
    fn test_apply_wraps_content_unescaped() {
        let mut engine = engine();
        let result = engine
            .apply("<p>Hello</p>", "article", &meta(json!({"title": "Post"})))
            .unwrap();
        assert_eq!(result, "<h1>Post</h1><article><p>Hello</p></article>");
    }

    #[test]
    fn test_metadata_is_escaped() {
        let mut engine = engine();
        let result = engine
            .apply(
                "<p>x</p>",
                "article",
                &meta(json!({"title": "Generics <T> & friends"})),
            )
            .unwrap();
        assert_eq!(
            result,
            "<h1>Generics &lt;T&gt; &amp; friends</h1><article><p>x</p></article>"
        );
    }

    #[test]
    fn test_double_stash_content_is_escaped() {
        let mut engine = TemplateEngine::new(
            MemoryTemplateSource::new().with_template("escaped", "<pre>{{content}}</pre>"),
        );
        assert_eq!(
            engine.apply("<b>", "escaped", &Map::new()).unwrap(),
            "<pre>&lt;b&gt;</pre>"
        );
    }

    #[test]
    fn test_content_wins_over_metadata() {
        let mut engine = engine();
        let result = engine
            .apply(
                "<p>real</p>",
                "article",
                &meta(json!({"title": "T", "content": "fake"})),
            )
            .unwrap();
        assert!(result.contains("<p>real</p>"));
        assert!(!result.contains("fake"));
    }

    #[test]
    fn test_epigraph_defaults_when_absent_or_not_array() {
        let mut engine = engine();
        let expected = format!("<blockquote>{EPIGRAPH_PLACEHOLDER}</blockquote>c");

        assert_eq!(engine.apply("c", "quotes", &Map::new()).unwrap(), expected);
        assert_eq!(
            engine
                .apply("c", "quotes", &meta(json!({"epigraph": "single"})))
                .unwrap(),
            expected
        );
    }

    #[test]
    fn test_epigraph_list_is_kept() {
        let mut engine = engine();
        let result = engine
            .apply("c", "quotes", &meta(json!({"epigraph": ["one", "two"]})))
            .unwrap();
        assert_eq!(result, "<blockquote>one</blockquote><blockquote>two</blockquote>c");
    }

    #[test]
    fn test_apply_is_deterministic() {
        let mut engine = engine();
        let metadata = meta(json!({"title": "T", "tags": ["a", "b"]}));
        let first = engine.apply("<p>x</p>", "article", &metadata).unwrap();
        let second = engine.apply("<p>x</p>", "article", &metadata).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_broken_template_is_reported() {
        let mut engine = engine();
        let err = engine.apply("c", "broken", &Map::new()).unwrap_err();
        assert!(matches!(err, TemplateError::Compile { ref name, .. } if name == "broken"));
        assert!(engine.has_template("article"));
    }

    #[test]
    fn test_reload_picks_up_new_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut engine = TemplateEngine::new(DirTemplateSource::new(dir.path()));
        assert!(engine.template_names().is_empty());

        std::fs::write(dir.path().join("plain.html"), "<main>{{{content}}}</main>").unwrap();
        assert!(!engine.has_template("plain"));

        engine.reload();
        assert_eq!(engine.template_names(), vec!["plain".to_owned()]);
        assert_eq!(
            engine.apply("x", "plain", &Map::new()).unwrap(),
            "<main>x</main>"
        );
    }
}
