//! Ls command - list a folder of the document library.

use anyhow::{Context as _, Result};
use clap::Args;

use super::Context;
use crate::display;

/// Arguments for the ls command.
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Folder path within the library, e.g. "Shared Documents/Reports"
    pub folder: Option<String>,
}

/// Run the ls command.
pub async fn run(args: LsArgs, ctx: &Context) -> Result<()> {
    let Some(token) = ctx.acquire_token().await? else {
        return Ok(());
    };
    let site = ctx.site()?;
    let client = ctx.graph_client(&token)?;

    let entries = client
        .drive()
        .list(&site, args.folder.as_deref())
        .await
        .with_context(|| format!("Failed to list files in {}", site))?;

    let title = match args.folder.as_deref().map(|f| f.trim_matches('/')) {
        Some(folder) if !folder.is_empty() => format!("{} / {}", site, folder),
        _ => site.to_string(),
    };
    display::print_entries(&title, &entries, ctx.json_output)
}
