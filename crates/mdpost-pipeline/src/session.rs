//! One host session: parse, post-render, template.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mdpost_capture::CaptureStore;
use mdpost_renderer::{TocEntry, escape_html};
use mdpost_template::TemplateEngine;
use serde_json::{Map, Value};

use crate::error::PipelineError;
use crate::manager::PipelineManager;
use crate::parser::DocumentParser;

/// Monotonic render counter shared between a session and whoever can start a
/// newer render.
///
/// Each render takes a ticket; a render whose ticket is no longer the latest
/// when it finishes is stale and its output is discarded.
#[derive(Clone, Debug, Default)]
pub struct RenderGeneration(Arc<AtomicU64>);

impl RenderGeneration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a render and return its ticket. Supersedes every earlier ticket.
    pub fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Latest ticket handed out.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_current(&self, ticket: u64) -> bool {
        self.current() == ticket
    }
}

/// Final output of a session render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedArticle {
    pub html: String,
    pub title: Option<String>,
    pub toc: Vec<TocEntry>,
    /// Template context metadata: front matter plus the derived title.
    pub metadata: Map<String, Value>,
    pub warnings: Vec<String>,
}

/// Pipeline context for one host session.
///
/// Owns the plugins, the parser and the templates; shares the config and
/// capture stores with the plugins registered in the manager.
pub struct Pipeline {
    manager: PipelineManager,
    parser: DocumentParser,
    templates: TemplateEngine,
    captures: Arc<CaptureStore>,
    generation: RenderGeneration,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        manager: PipelineManager,
        templates: TemplateEngine,
        captures: Arc<CaptureStore>,
    ) -> Self {
        Self {
            manager,
            parser: DocumentParser::new(),
            templates,
            captures,
            generation: RenderGeneration::new(),
        }
    }

    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.parser = DocumentParser::new().with_gfm(enabled);
        self
    }

    #[must_use]
    pub fn manager(&self) -> &PipelineManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut PipelineManager {
        &mut self.manager
    }

    pub fn templates_mut(&mut self) -> &mut TemplateEngine {
        &mut self.templates
    }

    /// Handle for superseding in-flight renders from elsewhere.
    #[must_use]
    pub fn generation(&self) -> RenderGeneration {
        self.generation.clone()
    }

    /// Start a new independent document: drop captures of the previous one.
    pub fn begin_document(&self) {
        self.captures.clear();
    }

    /// Re-attach parse-time plugins according to their current enablement.
    pub fn rebuild_parser(&mut self) {
        self.parser.rebuild(&self.manager);
    }

    /// Whether parse-time enablement changed since the parser was built.
    #[must_use]
    pub fn parser_is_stale(&self) -> bool {
        self.parser.is_stale(&self.manager)
    }

    /// Render `source` to final HTML.
    ///
    /// One settings snapshot serves the whole render. The template named by
    /// the settings wraps the result, with front matter as metadata and the
    /// first H1 as `title` when the front matter has none.
    pub async fn render(&mut self, source: &str) -> Result<RenderedArticle, PipelineError> {
        let ticket = self.generation.begin();
        let settings = self.manager.config_store().snapshot();

        let parsed = self
            .parser
            .parse_with(&mut self.manager, source, &settings)
            .await;
        let html = self.manager.process_content_with(&parsed.html, &settings);

        let mut metadata = parsed.front_matter;
        if let Some(title) = &parsed.title {
            metadata
                .entry("title")
                .or_insert_with(|| Value::String(title.clone()));
        }
        let html = self.templates.apply(&html, &settings.template, &metadata)?;

        let current = self.generation.current();
        if current != ticket {
            tracing::debug!(ticket, current, "render superseded, output discarded");
            return Err(PipelineError::Superseded { ticket, current });
        }

        Ok(RenderedArticle {
            html,
            title: parsed.title,
            toc: parsed.toc,
            metadata,
            warnings: parsed.warnings,
        })
    }

    /// Render `source` for display.
    ///
    /// Returns `None` for a superseded render. Any other failure yields an
    /// inline error fragment instead of a blank view.
    pub async fn render_html(&mut self, source: &str) -> Option<String> {
        match self.render(source).await {
            Ok(article) => Some(article.html),
            Err(PipelineError::Superseded { .. }) => None,
            Err(e) => {
                tracing::error!(error = %e, "render failed");
                Some(error_fragment(&e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("manager", &self.manager)
            .field("parser", &self.parser)
            .field("generation", &self.generation.current())
            .finish_non_exhaustive()
    }
}

/// Visible inline error shown in place of the article.
#[must_use]
pub fn error_fragment(message: &str) -> String {
    format!(
        concat!(
            r#"<section class="mdpost-error" style="padding:12px 16px;border-left:4px solid #d93025;"#,
            r#"background:#fdecea;color:#5f2120;font-size:14px;">"#,
            "<p><strong>Render failed</strong></p><pre style=\"white-space:pre-wrap;margin:0;\">{}</pre></section>"
        ),
        escape_html(message)
    )
}
