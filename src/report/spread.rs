use colored::*;

use super::{format_ms, format_time, render_header, RULE};
use crate::engine::SpreadReport;
use crate::spread::{SpreadAnalysis, SpreadStats, SyncClass};

const BAR_WIDTH: usize = 40;

/// Render a scheduling-spread histogram and its classification
pub fn render_spread(report: &SpreadReport) -> String {
    let params = &report.params;
    let mut out = render_header("⏱️ ", "Scheduling Spread");
    out.push_str(&format!(
        "Generated: {} | Horizon: {}s | Bucket: {}s | Sync threshold: {}s\n",
        format_time(report.generated_at),
        params.horizon_secs,
        params.bucket_width_secs,
        params.sync_threshold_secs
    ));
    out.push_str(RULE);

    match &report.analysis {
        SpreadAnalysis::NoData { discarded } => {
            out.push_str(&format!(
                "No data: no scheduled entity within the horizon ({} outside)\n",
                discarded
            ));
        }
        SpreadAnalysis::Analyzed(stats) => {
            out.push_str(&render_histogram(stats));
            out.push_str(RULE);
            out.push_str(&render_summary(stats));
        }
    }
    out
}

fn render_histogram(stats: &SpreadStats) -> String {
    let peak = stats.buckets.iter().map(|b| b.count).max().unwrap_or(0);
    let mut out = String::new();

    for bucket in &stats.buckets {
        let len = if peak == 0 {
            0
        } else {
            (bucket.count * BAR_WIDTH).div_ceil(peak)
        };
        out.push_str(&format!(
            "{:>9} - {:<9} {:>5} {}\n",
            format_ms(bucket.lower_secs),
            format_ms(bucket.upper_secs),
            bucket.count,
            "█".repeat(len)
        ));
    }
    out
}

fn render_summary(stats: &SpreadStats) -> String {
    let mut out = format!(
        "Samples: {} ({} outside horizon)\nMin: {}  Max: {}  Mean: {}  Spread: {}\n",
        stats.sample_count,
        stats.discarded,
        format_ms(stats.min_secs),
        format_ms(stats.max_secs),
        format_ms(stats.mean_secs),
        format_ms(stats.spread_secs)
    );

    let verdict = match stats.classification {
        SyncClass::Synchronized => "⚠️  SYNCHRONIZED: entities tick together".yellow().bold(),
        SyncClass::Desynchronized => "✅ DESYNCHRONIZED: ticks are spread out".green().bold(),
    };
    out.push_str(&verdict.to_string());
    if stats.degenerate {
        out.push_str(" (single sample)");
    }
    out.push('\n');
    out
}
