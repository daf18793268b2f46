//! Terminal rendering of diagnostics results.
//!
//! Every renderer takes a computed result and returns the full text of one
//! report. Nothing here queries a collaborator.

mod memory;
mod monitor;
mod ranking;
mod spread;

pub use memory::{
    render_baseline_set, render_collection, render_comparison, render_leak_check,
    render_memory_stats,
};
pub use monitor::render_monitor;
pub use ranking::{render_load, render_ranking};
pub use spread::render_spread;

use chrono::{DateTime, Utc};
use colored::*;

use crate::utils::config::BYTES_PER_MB;

const RULE: &str = "---------------------------------------------------\n";

fn render_header(icon: &str, title: &str) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(icon);
    out.push(' ');
    out.push_str(&title.bold().to_string());
    out.push('\n');
    out.push_str(RULE);
    out
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Bytes as megabytes with two decimals
fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / BYTES_PER_MB)
}

fn format_signed_mb(bytes: i64) -> String {
    format!("{:+.2} MB", bytes as f64 / BYTES_PER_MB)
}

/// Seconds as milliseconds with three decimals
fn format_ms(secs: f64) -> String {
    format!("{:.3}ms", secs * 1000.0)
}
