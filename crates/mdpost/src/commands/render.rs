//! `mdpost render` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use mdpost_config::CliSettings;
use mdpost_pipeline::Pipeline;
use mdpost_template::{DirTemplateSource, TemplateEngine};

use crate::error::CliError;
use crate::output::Output;
use crate::session::{Session, SessionArgs};

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Path to the Markdown file.
    input: PathBuf,

    #[command(flatten)]
    session: SessionArgs,

    /// Template directory (overrides config).
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Asset directory for `![[name]]` embeds (overrides config).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Template wrapping the article (overrides settings).
    #[arg(short, long)]
    template: Option<String>,

    /// Write HTML to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output (plugin and timing logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or the input cannot be read, or the
    /// template fails.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            templates_dir: self.templates,
            assets_dir: self.assets,
            template: self.template,
            ..Default::default()
        };
        // CLI overrides must not leak into the persisted settings.
        let session = Session::open(&self.session, cli_settings, false)?;
        let Session {
            host_config,
            host,
            manager,
        } = session;

        if let Some(template) = &host_config.render.template {
            host.config
                .update_settings(|settings| settings.template.clone_from(template));
        }

        let templates = TemplateEngine::new(DirTemplateSource::new(
            &host_config.paths_resolved.templates,
        ));
        let mut pipeline = Pipeline::new(manager, templates, Arc::clone(&host.captures))
            .with_gfm(host_config.render.gfm);

        let source = tokio::fs::read_to_string(&self.input).await?;
        output.info(&format!("Rendering {}...", self.input.display()));

        pipeline.begin_document();
        let article = pipeline.render(&source).await?;
        for warning in &article.warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, &article.html).await?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => output.document(&article.html)?,
        }
        Ok(())
    }
}
