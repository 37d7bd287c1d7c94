//! Built-in plugin catalogue.

use std::sync::Arc;

use mdpost_pipeline::{HostContext, PipelineError, PipelineManager};

use crate::parse_time::{CardPlugin, FootnotePlugin, HeadingPlugin, MathPlugin, WikiImagePlugin};
use crate::post_render::{
    CardRestorePlugin, CodeHighlightPlugin, ImageCaptionPlugin, InlineStylePlugin,
    TableWrapPlugin,
};

/// Build a manager with every built-in plugin registered.
///
/// Parse-time plugins come first, then post-render plugins. Post-render order
/// is significant: `card-restore` runs first so later transforms see restored
/// widget markup and skip it, and `inline-style` runs last so it styles the
/// final structure.
pub fn build_registry(host: &HostContext) -> Result<PipelineManager, PipelineError> {
    let mut manager = PipelineManager::new(Arc::clone(&host.config));

    manager.register_parse_time(WikiImagePlugin::new(
        Arc::clone(&host.assets),
        Arc::clone(&host.notices),
    ))?;
    manager.register_parse_time(HeadingPlugin::new())?;
    manager.register_parse_time(MathPlugin::new())?;
    manager.register_parse_time(FootnotePlugin::new())?;
    manager.register_parse_time(CardPlugin::new(Arc::clone(&host.captures)))?;

    manager.register_post_render(CardRestorePlugin::new(Arc::clone(&host.captures)))?;
    manager.register_post_render(CodeHighlightPlugin::new())?;
    manager.register_post_render(ImageCaptionPlugin::new())?;
    manager.register_post_render(TableWrapPlugin::new())?;
    manager.register_post_render(InlineStylePlugin::new())?;

    tracing::debug!(plugins = manager.len(), "plugin registry built");
    Ok(manager)
}

/// Builds the catalogue once per process.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    manager: Option<PipelineManager>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the manager, or return the one built by an earlier call.
    pub fn build(&mut self, host: &HostContext) -> Result<&mut PipelineManager, PipelineError> {
        let manager = match self.manager.take() {
            Some(manager) => {
                tracing::debug!("plugin registry already built, reusing");
                manager
            }
            None => build_registry(host)?,
        };
        Ok(self.manager.insert(manager))
    }

    #[must_use]
    pub fn manager(&self) -> Option<&PipelineManager> {
        self.manager.as_ref()
    }

    #[must_use]
    pub fn into_manager(self) -> Option<PipelineManager> {
        self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdpost_config::{ConfigStore, ConfigValue};
    use mdpost_pipeline::{Capability, Pipeline};
    use mdpost_template::{MemoryTemplateSource, TemplateEngine};
    use pretty_assertions::assert_eq;

    const POST_RENDER: &[&str] = &[
        "card-restore",
        "code-highlight",
        "image-caption",
        "table-wrap",
        "inline-style",
    ];

    fn host(json: &str) -> HostContext {
        HostContext::new(Arc::new(ConfigStore::from_json(json)))
    }

    fn pipeline(host: &HostContext) -> Pipeline {
        let manager = build_registry(host).unwrap();
        Pipeline::new(
            manager,
            TemplateEngine::new(MemoryTemplateSource::new()),
            Arc::clone(&host.captures),
        )
    }

    #[test]
    fn test_registration_order() {
        let manager = build_registry(&host("{}")).unwrap();
        assert_eq!(
            manager.names(),
            vec![
                "wiki-image",
                "heading",
                "math",
                "footnote",
                "card",
                "card-restore",
                "code-highlight",
                "image-caption",
                "table-wrap",
                "inline-style",
            ]
        );
        let post: Vec<&str> = manager
            .post_render_plugins()
            .into_iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(post, POST_RENDER);
        assert!(
            manager
                .export()
                .iter()
                .take(5)
                .all(|p| p.capability == Capability::ParseTime)
        );
    }

    #[test]
    fn test_defaults_seeded() {
        let host = host("{}");
        build_registry(&host).unwrap();
        let config = host.config.get("code-highlight");
        assert!(config.enabled);
        assert_eq!(config.get("macStyle"), Some(&ConfigValue::from(true)));
    }

    #[test]
    fn test_build_is_idempotent() {
        let host = host("{}");
        let mut registry = PluginRegistry::new();
        let first = registry.build(&host).unwrap().len();
        let second = registry.build(&host).unwrap().len();
        assert_eq!(first, 10);
        assert_eq!(second, 10);
        assert!(registry.manager().is_some());
    }

    #[tokio::test]
    async fn test_scenario_a_heading_and_paragraph() {
        let host = host("{}");
        for name in POST_RENDER {
            host.config.set_enabled(name, false);
        }
        let mut pipeline = pipeline(&host);

        let html = pipeline.render_html("# Title\n\nHello").await.unwrap();
        assert_eq!(
            html,
            concat!(
                r#"<h1 id="title" class="mdpost-heading"><span class="prefix"></span>"#,
                r#"<span class="content">Title</span><span class="suffix"></span></h1>"#,
                "<p>Hello</p>"
            )
        );
    }

    #[tokio::test]
    async fn test_scenario_b_card_survives_post_render() {
        let host = host("{}");
        let mut pipeline = pipeline(&host);

        let source = concat!(
            "# Title\n\n",
            "```card id=\"x\"\n<payload/>\n```\n\n",
            "Text with `code`.\n\n",
            "```rust\nlet a = 1;\n```\n"
        );
        let html = pipeline.render_html(source).await.unwrap();

        assert!(html.contains(r#"data-id="x"><payload/></section>"#));
        assert!(html.contains(r#"<pre class="hljs code-block mac""#));
        assert!(html.contains("<p style="));
    }

    #[tokio::test]
    async fn test_scenario_c_toggle_semantics() {
        let host = host("{}");
        let mut pipeline = pipeline(&host);

        let table = "<table><tr><td>1</td></tr></table>";
        let wrapped = pipeline.manager().process_content(table);
        assert!(wrapped.contains("table-container"));
        pipeline.manager().set_enabled("table-wrap", false).unwrap();
        let unwrapped = pipeline.manager().process_content(table);
        assert!(!unwrapped.contains("table-container"));

        let first = pipeline.render_html("## A").await.unwrap();
        assert!(first.contains("mdpost-heading"));
        pipeline.manager().set_enabled("heading", false).unwrap();
        assert!(pipeline.parser_is_stale());
        let still = pipeline.render_html("## A").await.unwrap();
        assert!(still.contains("mdpost-heading"));

        pipeline.rebuild_parser();
        let rebuilt = pipeline.render_html("## A").await.unwrap();
        assert!(!rebuilt.contains("mdpost-heading"));
    }

    #[tokio::test]
    async fn test_standalone_image_is_not_wrapped_in_paragraph() {
        let host = host("{}");
        let mut pipeline = pipeline(&host);
        let html = pipeline.render_html("![Cat](c.png)\n").await.unwrap();
        assert!(html.starts_with("<figure"));
        assert!(html.ends_with("</figure>"));
        assert!(!html.contains("<p"));
    }

    #[tokio::test]
    async fn test_render_is_deterministic() {
        let host = host(r#"{"theme": "elegant", "highlight": "monokai"}"#);
        let mut pipeline = pipeline(&host);
        let source = "# T\n\nA[^1] ![cat](c.png \"Cat\")\n\n| a |\n|---|\n| 1 |\n\n[^1]: Note.\n";

        let first = pipeline.render_html(source).await.unwrap();
        let second = pipeline.render_html(source).await.unwrap();
        assert_eq!(first, second);
        assert!(first.contains("table-container"));
        assert!(first.contains(r#"<figcaption class="image-caption""#));
        assert!(first.contains(r#"class="footnotes""#));
    }
}
