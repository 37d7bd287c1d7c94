//! Horizontal scroll containers for tables.

use mdpost_pipeline::{PluginError, PostRenderPlugin, ProcessContext};

use crate::splice::{Splices, editable_elements};

const CONTAINER_OPEN: &str = r#"<section class="table-container" style="overflow-x:auto;">"#;

/// Wraps each outermost table in a scrollable section so wide tables do not
/// overflow narrow viewports.
#[derive(Debug, Default)]
pub struct TableWrapPlugin;

impl TableWrapPlugin {
    pub const NAME: &'static str = "table-wrap";

    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PostRenderPlugin for TableWrapPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn process(&self, html: &str, _ctx: &ProcessContext<'_>) -> Result<String, PluginError> {
        let elements = editable_elements(html);
        let containers: Vec<_> = elements
            .iter()
            .filter(|el| el.tag == "section" && el.has_class("table-container"))
            .collect();

        let mut splices = Splices::new();
        let mut last_end = 0;
        for table in elements.iter().filter(|el| el.tag == "table") {
            if table.outer.start < last_end {
                continue;
            }
            last_end = table.outer.end;
            if containers
                .iter()
                .any(|c| c.inner.contains(&table.outer.start))
            {
                continue;
            }
            splices.replace(
                table.outer.clone(),
                format!("{CONTAINER_OPEN}{}</section>", &html[table.outer.clone()]),
            );
        }
        Ok(splices.apply(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdpost_config::{PluginConfig, Settings};
    use pretty_assertions::assert_eq;

    fn process(html: &str) -> String {
        let settings = Settings::default();
        let config = PluginConfig::default();
        TableWrapPlugin::new()
            .process(
                html,
                &ProcessContext {
                    settings: &settings,
                    config: &config,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_wraps_table() {
        let html = "<p>a</p><table><tr><td>1</td></tr></table>";
        assert_eq!(
            process(html),
            concat!(
                "<p>a</p>",
                r#"<section class="table-container" style="overflow-x:auto;">"#,
                "<table><tr><td>1</td></tr></table></section>"
            )
        );
    }

    #[test]
    fn test_idempotent() {
        let once = process("<table><tr><td><table></table></td></tr></table>");
        assert_eq!(process(&once), once);
        assert_eq!(once.matches("table-container").count(), 1);
    }
}
