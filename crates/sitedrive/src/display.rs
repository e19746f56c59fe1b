//! Plain-text rendering of directory entries.

use anyhow::Result;
use console::{Style, style};

use sitedrive_client::DirectoryEntry;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Human-readable size; empty for zero.
pub fn format_size(size: u64) -> String {
    match size {
        0 => String::new(),
        s if s < KB => format!("{} B", s),
        s if s < MB => format!("{:.2} KB", s as f64 / KB as f64),
        s if s < GB => format!("{:.2} MB", s as f64 / MB as f64),
        s => format!("{:.2} GB", s as f64 / GB as f64),
    }
}

/// Size column for an entry. Folders never show one.
pub fn entry_size(entry: &DirectoryEntry) -> String {
    if entry.is_folder {
        String::new()
    } else {
        format_size(entry.size)
    }
}

/// `YYYY-MM-DD`, or empty when unknown.
pub fn entry_date(entry: &DirectoryEntry) -> String {
    entry
        .last_modified
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Print entries as a table, or as JSON.
pub fn print_entries(title: &str, entries: &[DirectoryEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", style(title).bold());
    println!("{}", dim.apply_to("─".repeat(60)));

    if entries.is_empty() {
        println!("{}", dim.apply_to("No files found"));
        return Ok(());
    }

    let name_width = entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(20, 60);

    for entry in entries {
        let marker = if entry.is_folder {
            style("📁").blue()
        } else {
            style("📄").white()
        };
        println!(
            "{} {:<width$}  {:>10}  {}",
            marker,
            entry.name,
            entry_size(entry),
            dim.apply_to(entry_date(entry)),
            width = name_width
        );
    }

    println!();
    println!(
        "{}",
        dim.apply_to(format!(
            "{} item{}",
            entries.len(),
            if entries.len() == 1 { "" } else { "s" }
        ))
    );
    Ok(())
}
