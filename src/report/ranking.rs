use super::{format_ms, format_time, render_header, RULE};
use crate::engine::{LoadReport, RankingReport};
use crate::ranking::{RankedEntity, WindowValue};

/// Render a merged duration ranking
pub fn render_ranking(report: &RankingReport) -> String {
    let mut out = render_header(
        "📊",
        &format!("Top {} by {} duration", report.k, report.metric.label()),
    );

    let floors: Vec<String> = report
        .windows
        .iter()
        .map(|w| format!("{} (≥{} events)", w.span.label(), w.min_events))
        .collect();
    out.push_str(&format!(
        "Generated: {} | Entities: {} | Windows: {}\n",
        format_time(report.generated_at),
        report.entity_count,
        floors.join(", ")
    ));
    out.push_str(RULE);

    if report.entries.is_empty() {
        out.push_str("No data: no entity met the event floor of any window\n");
        return out;
    }

    for (rank, entry) in report.entries.iter().enumerate() {
        out.push_str(&render_ranked_entry(rank + 1, entry));
    }
    out
}

fn render_ranked_entry(rank: usize, entry: &RankedEntity) -> String {
    let windows: Vec<String> = entry.windows.iter().map(render_window_value).collect();
    format!(
        "{:>3}. {} {} ({})  score {}  {}\n",
        rank,
        entry.name,
        entry.id,
        entry.kind.as_str(),
        format_ms(entry.score),
        windows.join("  ")
    )
}

fn render_window_value(window: &WindowValue) -> String {
    match window.value {
        Some(v) => format!(
            "{}: {} ({})",
            window.span.label(),
            format_ms(v),
            window.total_events
        ),
        None => format!("{}: - ({})", window.span.label(), window.total_events),
    }
}

/// Render a load ranking with projected admission delays
pub fn render_load(report: &LoadReport) -> String {
    let mut out = render_header("📦", &format!("Top {} by '{}' load", report.k, report.category));
    out.push_str(&format!(
        "Generated: {} | Entities: {} | Throttle: {} per tick every {}s\n",
        format_time(report.generated_at),
        report.entity_count,
        report.throttle.per_tick_limit,
        report.throttle.tick_interval_secs
    ));
    out.push_str(RULE);

    if report.entries.is_empty() {
        out.push_str(&format!(
            "No data: no entity reports category '{}'\n",
            report.category
        ));
        return out;
    }

    for (rank, entry) in report.entries.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {} {} ({})  {} members  {} ticks  ~{:.2}s to admit\n",
            rank + 1,
            entry.name,
            entry.id,
            entry.kind.as_str(),
            entry.count,
            entry.ticks_needed,
            entry.delay_secs
        ));
    }
    out
}
