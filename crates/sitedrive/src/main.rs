//! sitedrive - browse SharePoint document libraries from the command line
//!
//! Main entry point for the sitedrive CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::Style;

mod commands;
mod display;

use commands::{auth, get, ls, search};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// sitedrive - browse SharePoint document libraries from the command line
#[derive(Parser)]
#[command(name = "sitedrive")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// SharePoint site URL, e.g. https://contoso.sharepoint.com/sites/demo
    #[arg(long, global = true, env = "SHAREPOINT_SITE_URL")]
    pub site: Option<String>,

    /// Graph API base URL (default: https://graph.microsoft.com/v1.0)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authentication management
    Auth(auth::AuthArgs),

    /// List files and folders in the site's document library
    Ls(ls::LsArgs),

    /// Search the site's document library
    Search(search::SearchArgs),

    /// Download a file
    Get(get::GetArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // .env never overrides variables that are already set
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing: console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "sitedrive=debug,sitedrive_auth=debug,sitedrive_client=debug,sitedrive_config=debug,warn"
    } else {
        "sitedrive=info,sitedrive_auth=info,sitedrive_client=info,sitedrive_config=info,warn"
    };

    let log_dir = sitedrive_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "sitedrive.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(cli.verbose)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "sitedrive=trace,sitedrive_auth=trace,sitedrive_client=trace,sitedrive_config=trace,info",
                )),
        )
        .init();

    if let Err(e) = run(cli).await {
        let red = Style::new().red();
        eprintln!("{} {:#}", red.apply_to("Error:"), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = commands::Context::load(cli.site, cli.endpoint, cli.json)?;

    // Dispatch to command handlers
    match cli.command {
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Ls(args) => ls::run(args, &ctx).await,
        Commands::Search(args) => search::run(args, &ctx).await,
        Commands::Get(args) => get::run(args, &ctx).await,
    }
}
