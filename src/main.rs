use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

#[derive(Parser)]
#[command(name = "wikimark", version, about)]
struct Args {
    /// Enable info-level logging
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    command: WikimarkCommand,
}

#[derive(Parser)]
struct RenderArgs {
    /// The Markdown file to render
    file: PathBuf,

    /// The path to the configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Print a JSON object with the HTML and page metadata
    #[arg(long, default_value = "false")]
    json: bool,
}

#[derive(Parser)]
struct ServeArgs {
    /// The address to bind to (overrides `server.bind`)
    #[arg(short, long)]
    bind: Option<String>,

    /// The port to bind to (overrides `server.port`)
    #[arg(short, long)]
    port: Option<u16>,

    /// The path to the configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum WikimarkCommand {
    /// Render a single Markdown file to HTML
    Render(RenderArgs),

    /// Serve the wiki over HTTP
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    // --verbose enables INFO level, otherwise use RUST_LOG
    let filter = if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        WikimarkCommand::Render(args) => {
            commands::render::run(&args)?;
        }
        WikimarkCommand::Serve(args) => {
            commands::serve::run(&args).await?;
        }
    }

    Ok(())
}
