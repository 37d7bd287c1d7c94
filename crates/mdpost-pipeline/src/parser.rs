//! Markdown source to HTML, with parse-time plugins attached.

use mdpost_config::Settings;
use mdpost_renderer::{MarkdownRenderer, RenderResult, TocEntry, TokenRule};
use serde_json::{Map, Value};

use crate::manager::PipelineManager;
use crate::plugin::HookContext;

/// Output of one parse.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedDocument {
    pub html: String,
    /// Title from the first H1.
    pub title: Option<String>,
    pub toc: Vec<TocEntry>,
    /// YAML front matter as a JSON object; empty without front matter.
    pub front_matter: Map<String, Value>,
    /// Token rule and hook failures, as `plugin: message`.
    pub warnings: Vec<String>,
}

/// The set of parse-time plugins attached when the engine was built.
#[derive(Debug)]
struct ParseEngine {
    attached: Vec<String>,
}

/// Orchestrates one parse: `prepare`, `preprocess`, the engine with token
/// rules, `postprocess`.
///
/// The engine is built lazily from the plugins enabled at build time and kept
/// until [`rebuild`](Self::rebuild) or [`invalidate`](Self::invalidate).
/// Toggling a parse-time plugin therefore changes nothing until then.
#[derive(Debug)]
pub struct DocumentParser {
    engine: Option<ParseEngine>,
    gfm: bool,
}

impl DocumentParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: None,
            gfm: true,
        }
    }

    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self.engine = None;
        self
    }

    #[must_use]
    pub fn is_built(&self) -> bool {
        self.engine.is_some()
    }

    /// Names of the attached plugins, empty before the first build.
    #[must_use]
    pub fn attached(&self) -> &[String] {
        self.engine
            .as_ref()
            .map(|engine| engine.attached.as_slice())
            .unwrap_or_default()
    }

    /// Whether the attached set differs from what a rebuild would attach now.
    #[must_use]
    pub fn is_stale(&self, manager: &PipelineManager) -> bool {
        self.engine
            .as_ref()
            .is_some_and(|engine| engine.attached != enabled_parse_time(manager))
    }

    /// Attach every currently enabled parse-time plugin.
    pub fn rebuild(&mut self, manager: &PipelineManager) {
        let attached = enabled_parse_time(manager);
        tracing::debug!(attached = ?attached, "parse engine built");
        self.engine = Some(ParseEngine { attached });
    }

    /// Drop the engine; the next parse rebuilds it.
    pub fn invalidate(&mut self) {
        self.engine = None;
    }

    /// Parse `source` with a fresh settings snapshot.
    pub async fn parse(&mut self, manager: &mut PipelineManager, source: &str) -> ParsedDocument {
        let settings = manager.config_store().snapshot();
        self.parse_with(manager, source, &settings).await
    }

    /// Parse `source`; every hook of this parse sees `settings`.
    ///
    /// Hook and token rule failures are logged, recorded as warnings, and the
    /// failing step is skipped.
    pub async fn parse_with(
        &mut self,
        manager: &mut PipelineManager,
        source: &str,
        settings: &Settings,
    ) -> ParsedDocument {
        if self.engine.is_none() {
            self.rebuild(manager);
        }
        let attached = self.attached().to_vec();
        let mut warnings = Vec::new();

        for plugin in manager.parse_time_plugins_mut() {
            if !attached.iter().any(|name| name == plugin.name()) {
                continue;
            }
            let config = settings.plugin_config(plugin.name());
            let ctx = HookContext {
                settings,
                config: &config,
            };
            if let Err(e) = plugin.prepare(&ctx).await {
                tracing::error!(plugin = plugin.name(), error = %e, "prepare failed");
                warnings.push(format!("{}: {e}", plugin.name()));
            }
        }

        let mut source = source.to_owned();
        for plugin in manager.parse_time_plugins_mut() {
            if !attached.iter().any(|name| name == plugin.name()) {
                continue;
            }
            let config = settings.plugin_config(plugin.name());
            let ctx = HookContext {
                settings,
                config: &config,
            };
            match plugin.preprocess(&source, &ctx).await {
                Ok(processed) => source = processed,
                Err(e) => {
                    tracing::error!(plugin = plugin.name(), error = %e, "preprocess failed, source unchanged");
                    warnings.push(format!("{}: {e}", plugin.name()));
                }
            }
        }

        let rendered = render(manager, &attached, &source, self.gfm);
        warnings.extend(rendered.warnings);
        let front_matter = rendered
            .front_matter
            .as_deref()
            .map(parse_front_matter)
            .unwrap_or_default();

        let mut html = rendered.html;
        for plugin in manager.parse_time_plugins_mut() {
            if !attached.iter().any(|name| name == plugin.name()) {
                continue;
            }
            let config = settings.plugin_config(plugin.name());
            let ctx = HookContext {
                settings,
                config: &config,
            };
            match plugin.postprocess(&html, &ctx).await {
                Ok(processed) => html = processed,
                Err(e) => {
                    tracing::error!(plugin = plugin.name(), error = %e, "postprocess failed, html unchanged");
                    warnings.push(format!("{}: {e}", plugin.name()));
                }
            }
        }

        ParsedDocument {
            html,
            title: rendered.title,
            toc: rendered.toc,
            front_matter,
            warnings,
        }
    }
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}

fn enabled_parse_time(manager: &PipelineManager) -> Vec<String> {
    let settings = manager.config_store().snapshot();
    manager
        .parse_time_plugins()
        .into_iter()
        .map(|plugin| plugin.name().to_owned())
        .filter(|name| settings.is_enabled(name))
        .collect()
}

/// Run the engine with the attached plugins' token rules.
fn render(
    manager: &mut PipelineManager,
    attached: &[String],
    source: &str,
    gfm: bool,
) -> RenderResult {
    let rules = manager
        .parse_time_plugins_mut()
        .filter(|plugin| attached.iter().any(|name| name == plugin.name()))
        .map(|plugin| plugin as &mut dyn TokenRule);

    MarkdownRenderer::new()
        .with_title_extraction()
        .with_gfm(gfm)
        .with_rules(rules)
        .render_markdown(source)
}

fn parse_front_matter(yaml: &str) -> Map<String, Value> {
    if yaml.trim().is_empty() {
        return Map::new();
    }
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Null) => Map::new(),
        Ok(_) => {
            tracing::warn!("front matter is not a mapping, ignored");
            Map::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "invalid front matter, ignored");
            Map::new()
        }
    }
}
