//! mdpost CLI - Markdown to platform-ready HTML.
//!
//! Provides commands for:
//! - `render`: Render a Markdown file through the plugin pipeline
//! - `plugins`: Print the plugin catalogue with config and schema as JSON
//! - `config set|enable|disable`: Edit persisted plugin configuration

mod assets;
mod commands;
mod error;
mod output;
mod session;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConfigCommand, PluginsArgs, RenderArgs};
use output::Output;

/// mdpost - Markdown to platform-ready HTML.
#[derive(Parser)]
#[command(name = "mdpost", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a Markdown file.
    Render(RenderArgs),
    /// Print registered plugins as JSON.
    Plugins(PluginsArgs),
    /// Plugin configuration commands.
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(args.execute())
        }
        Commands::Plugins(args) => args.execute(),
        Commands::Config(cmd) => cmd.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
