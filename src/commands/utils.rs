use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use super::models::COMMANDS;
use crate::snapshot::{read_snapshot, EntityKind};
use crate::utils::config::SCHEMA_VERSION;

/// Render the operation list
pub fn render_help() -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&"Tickscope operations".bold().to_string());
    out.push('\n');

    let width = COMMANDS
        .iter()
        .map(|c| c.name.len() + c.args.len() + 1)
        .max()
        .unwrap_or(0);
    for usage in COMMANDS {
        let call = format!("{} {}", usage.name, usage.args);
        out.push_str(&format!(
            "  {:<width$}  {}\n",
            call.trim_end(),
            usage.summary,
            width = width
        ));
    }
    out
}

/// Validate a registry snapshot file
pub fn validate_snapshot_file(file_path: &Path) -> Result<()> {
    println!("Validating snapshot: {}", file_path.display());

    let snapshot = read_snapshot(file_path)
        .with_context(|| format!("Invalid snapshot {}", file_path.display()))?;
    let scheduled = snapshot
        .entities
        .iter()
        .filter(|e| e.next_tick_at.is_some())
        .count();

    println!("✓ Valid snapshot JSON");
    println!("  Captured at: {}s", snapshot.captured_at);
    println!("  Entities: {}", snapshot.len());
    println!("  Players: {}", snapshot.count_kind(EntityKind::Player));
    println!("  Creatures: {}", snapshot.count_kind(EntityKind::Creature));
    println!("  Scheduled: {}", scheduled);

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("Tickscope v{}", env!("CARGO_PKG_VERSION"));
    println!("Snapshot Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("On-demand ranking, scheduling-spread and memory-growth diagnostics");
    println!("for live tick-based servers.");
}
