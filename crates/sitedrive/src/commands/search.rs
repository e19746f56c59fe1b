//! Search command - search the document library.

use anyhow::{Context as _, Result};
use clap::Args;

use super::Context;
use crate::display;

/// Arguments for the search command.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query (matches file names and content)
    pub query: String,
}

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let Some(token) = ctx.acquire_token().await? else {
        return Ok(());
    };
    let site = ctx.site()?;
    let client = ctx.graph_client(&token)?;

    tracing::debug!(query = %args.query, site = %site, "searching");

    let entries = client
        .drive()
        .search(&site, &args.query)
        .await
        .with_context(|| format!("Search for \"{}\" failed", args.query))?;

    display::print_entries(
        &format!("Results for \"{}\"", args.query),
        &entries,
        ctx.json_output,
    )
}
