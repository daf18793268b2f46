use colored::*;

use super::{format_mb, format_signed_mb, format_time, render_header, RULE};
use crate::engine::BaselineSetReport;
use crate::memory::{
    CollectMode, CollectionReport, GrowthComparison, GrowthTier, HeapStats, LeakCheckReport,
    MemoryStatsReport, ProcessStats, Section,
};

pub fn render_baseline_set(report: &BaselineSetReport) -> String {
    let mut out = render_header("📌", "Memory Baseline Set");
    out.push_str(&format!("Session:  {}\n", report.session));
    out.push_str(&format!(
        "Captured: {} at {}\n",
        format_mb(report.baseline.captured_bytes),
        format_time(report.baseline.captured_at)
    ));
    if let Some(previous) = report.replaced_bytes {
        out.push_str(&format!("Replaced: {}\n", format_mb(previous)));
    }
    out
}

/// Render growth against a baseline, tier label last
pub fn render_comparison(report: &GrowthComparison) -> String {
    let mut out = render_header("📈", "Memory Growth Since Baseline");
    out.push_str(&format!("Session:  {}\n", report.session));
    out.push_str(&format!(
        "Baseline: {} at {}\n",
        format_mb(report.baseline_bytes),
        format_time(report.captured_at)
    ));
    out.push_str(&format!(
        "Current:  {} at {}\n",
        format_mb(report.current_bytes),
        format_time(report.compared_at)
    ));
    out.push_str(RULE);

    let symbol = match report.growth_bytes {
        g if g > 0 => "📈",
        g if g < 0 => "📉",
        _ => "➡️",
    };
    out.push_str(&format!(
        "{} Growth: {} ({:+.2}%) over {:.0}s\n",
        symbol,
        format_signed_mb(report.growth_bytes),
        report.growth_percent,
        report.elapsed_secs
    ));
    match report.growth_rate_per_hour {
        Some(rate) => out.push_str(&format!("   Rate:   {}/hour\n", format_signed_mb(rate as i64))),
        None => out.push_str("   Rate:   n/a (no time elapsed)\n"),
    }

    out.push_str(RULE);
    out.push_str(&tier_label(report.tier, report.growth_percent));
    out.push('\n');
    out
}

fn tier_label(tier: GrowthTier, percent: f64) -> String {
    let label = match tier {
        GrowthTier::Severe => format!("❌ SEVERE GROWTH ({:.1}%)", percent).red().bold(),
        GrowthTier::Caution => format!("⚠️  CAUTION ({:.1}%)", percent).yellow().bold(),
        GrowthTier::Normal => format!("✅ NORMAL ({:.1}%)", percent).green().bold(),
    };
    label.to_string()
}

/// Render a leak check; failing probes become inline error lines
pub fn render_leak_check(report: &LeakCheckReport) -> String {
    let mut out = render_header("🔍", "Leak Check");
    out.push_str(&format!("Checked:   {}\n", format_time(report.checked_at)));
    out.push_str(&format!("Before:    {}\n", format_mb(report.before_bytes)));
    out.push_str(&format!("Retained:  {}\n", format_mb(report.retained_bytes)));
    out.push_str(&format!(
        "Collected: {}\n",
        format_signed_mb(report.collected_bytes)
    ));

    if !report.probes.is_empty() {
        out.push_str("\nCounters:\n");
        for probe in &report.probes {
            match &probe.value {
                Section::Value(v) => out.push_str(&format!("  {}: {}\n", probe.name, v)),
                Section::Error(e) => out.push_str(&format!(
                    "  {}: {}\n",
                    probe.name,
                    format!("error: {}", e).red()
                )),
            }
        }
    }

    out.push_str(RULE);
    out.push_str(&format!("Note: {}\n", report.note));
    out
}

/// Render process and heap statistics, one inline error per failed section
pub fn render_memory_stats(report: &MemoryStatsReport) -> String {
    let mut out = render_header("🧮", "Memory Statistics");

    out.push_str("Process:\n");
    out.push_str(&render_section(&report.process, render_process));
    out.push_str("Heap:\n");
    out.push_str(&render_section(&report.heap, render_heap));
    out.push_str(&render_section(&report.live_bytes, |bytes| {
        format!("  Live:          {}\n", format_mb(*bytes))
    }));
    out.push_str(&format!("  Max generation: {}\n", report.max_generation));
    out
}

fn render_section<T>(section: &Section<T>, render: impl Fn(&T) -> String) -> String {
    match section {
        Section::Value(v) => render(v),
        Section::Error(e) => format!("  {}\n", format!("error: {}", e).red()),
    }
}

fn render_process(stats: &ProcessStats) -> String {
    let threads = stats
        .thread_count
        .map(|t| t.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "  CPU time:      {:.2}s\n  Working set:   {}\n  Threads:       {}\n",
        stats.cpu_time_secs,
        format_mb(stats.working_set_bytes),
        threads
    )
}

fn render_heap(heap: &HeapStats) -> String {
    let mut out = format!("  Heap size:     {}\n", format_mb(heap.heap_bytes));
    if let Some(percent) = heap.fragmentation_percent() {
        out.push_str(&format!("  Fragmentation: {:.1}%\n", percent));
    }
    if !heap.pause_durations_ms.is_empty() {
        out.push_str(&format!(
            "  Pauses:        {} totalling {:.2}ms\n",
            heap.pause_durations_ms.len(),
            heap.total_pause_ms()
        ));
    }
    for generation in &heap.generations {
        out.push_str(&format!(
            "  Gen {}:         {} ({} collections)\n",
            generation.index,
            format_mb(generation.size_bytes),
            generation.collections
        ));
    }
    out
}

pub fn render_collection(report: &CollectionReport) -> String {
    let mode = match report.mode {
        CollectMode::Full => "full collection".to_string(),
        CollectMode::Generation(g) => format!("generation {} collection", g),
    };

    let mut out = render_header("🧹", "Collection");
    out.push_str(&format!("Ran {} in {:.2}ms\n", mode, report.duration_ms));
    out.push_str(&format!(
        "{} -> {} (freed {})\n",
        format_mb(report.before_bytes),
        format_mb(report.after_bytes),
        format_signed_mb(report.freed_bytes)
    ));
    out
}
