//! Get command - download a file.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the get command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// File path within the library, e.g. "Shared Documents/report.docx"
    pub path: String,

    /// Where to write the file (default: the file's name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Run the get command.
pub async fn run(args: GetArgs, ctx: &Context) -> Result<()> {
    let output = match args.output {
        Some(output) => output,
        None => default_output(&args.path)?,
    };

    let Some(token) = ctx.acquire_token().await? else {
        return Ok(());
    };
    let site = ctx.site()?;
    let client = ctx.graph_client(&token)?;

    let bytes = client
        .drive()
        .content(&site, &args.path)
        .await
        .with_context(|| format!("Failed to download {}", args.path))?;

    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if ctx.json_output {
        let result = serde_json::json!({
            "path": args.path,
            "output": output,
            "bytes": bytes.len(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let green = Style::new().green();
        println!(
            "{} Saved {} ({} bytes)",
            green.apply_to("✓"),
            output.display(),
            bytes.len()
        );
    }
    Ok(())
}

/// Last segment of the remote path.
fn default_output(remote: &str) -> Result<PathBuf> {
    remote
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(|name| Path::new(name).to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Cannot derive a file name from {:?}; pass --output", remote))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output("Shared Documents/report.docx").unwrap(),
            PathBuf::from("report.docx")
        );
        assert_eq!(default_output("notes.txt").unwrap(), PathBuf::from("notes.txt"));
        assert!(default_output("/").is_err());
        assert!(default_output("a/..").is_err());
    }
}
