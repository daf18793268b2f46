//! Multi-window top-K merge ranking.
//!
//! One combinator serves every "slowest entities" report: filter each window
//! by an event-count floor, take the top K of each window, union the
//! candidates and re-rank them by their best value across windows.

use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::snapshot::{EntityId, EntityKind, MetricWindow, TrackedEntity, WindowSpan};

/// Minimum number of events a window must hold before its values count.
///
/// Sparse windows produce unstable averages and maxima, so they are
/// treated as if the entity had no data for that window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowThreshold {
    pub span: WindowSpan,
    pub min_events: u64,
}

impl WindowThreshold {
    pub fn new(span: WindowSpan, min_events: u64) -> Self {
        Self { span, min_events }
    }

    /// Value of `metric` for this window, or `None` when the entity has no
    /// data for the window or falls under the event floor
    fn value_of<F>(&self, entity: &TrackedEntity, metric: &F) -> Option<f64>
    where
        F: Fn(&MetricWindow) -> f64,
    {
        entity
            .window(self.span)
            .filter(|w| w.total_events >= self.min_events)
            .map(metric)
    }
}

/// Built-in metric extractors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMetric {
    Average,
    Longest,
    Last,
}

impl RankMetric {
    pub fn extract(self, window: &MetricWindow) -> f64 {
        match self {
            RankMetric::Average => window.average_duration,
            RankMetric::Longest => window.longest_duration,
            RankMetric::Last => window.last_duration,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RankMetric::Average => "average",
            RankMetric::Longest => "longest",
            RankMetric::Last => "last",
        }
    }
}

/// Per-window detail attached to a ranked entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowValue {
    pub span: WindowSpan,

    /// Events in the window (0 when the window is absent)
    pub total_events: u64,

    /// Metric value, `None` when absent or under the event floor
    pub value: Option<f64>,
}

/// One row of a merged ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,

    /// Maximum metric value across the qualifying windows
    pub score: f64,

    pub windows: Vec<WindowValue>,
}

/// Rank entities by the maximum of `metric` over several windows
///
/// **Public** - the single ranking combinator behind every duration report
///
/// # Arguments
/// * `entities` - One snapshot of the registry
/// * `windows` - Windows to rank over, each with its event floor
/// * `metric` - Extractor applied to each window
/// * `k` - Maximum number of entities returned
///
/// # Returns
/// At most `k` entities, descending by score, ties by ascending id.
/// Empty when nothing passes any window's floor.
///
/// # Algorithm
/// 1. Per window, keep entities meeting the event floor
/// 2. Rank each window's set by `metric` and keep its top `k`
/// 3. Union the candidates, deduplicated by id
/// 4. Score each candidate by its best qualifying window; windows where it
///    does not qualify count as negative infinity, never zero
/// 5. Sort and truncate to `k`
pub fn top_k_merged<F>(
    entities: &[TrackedEntity],
    windows: &[WindowThreshold],
    metric: F,
    k: usize,
) -> Vec<RankedEntity>
where
    F: Fn(&MetricWindow) -> f64,
{
    if k == 0 || entities.is_empty() || windows.is_empty() {
        return Vec::new();
    }

    let mut candidates: BTreeMap<EntityId, &TrackedEntity> = BTreeMap::new();
    for threshold in windows {
        let top = window_top_k(entities, threshold, &metric, k);
        debug!(
            "Window {}: {} candidates (floor {} events)",
            threshold.span.label(),
            top.len(),
            threshold.min_events
        );
        for entity in top {
            candidates.entry(entity.id).or_insert(entity);
        }
    }

    let mut ranked: Vec<RankedEntity> = candidates
        .into_values()
        .map(|entity| score_entity(entity, windows, &metric))
        .collect();

    ranked.sort_by(|a, b| descending(a.score, b.score).then_with(|| a.id.cmp(&b.id)));
    ranked.truncate(k);
    ranked
}

/// Rank by one of the built-in metrics
pub fn rank_by(
    entities: &[TrackedEntity],
    windows: &[WindowThreshold],
    metric: RankMetric,
    k: usize,
) -> Vec<RankedEntity> {
    top_k_merged(entities, windows, |w| metric.extract(w), k)
}

/// Top `k` of a single window after its event floor is applied
///
/// **Private** - steps 1 and 2 of the merge
fn window_top_k<'a, F>(
    entities: &'a [TrackedEntity],
    threshold: &WindowThreshold,
    metric: &F,
    k: usize,
) -> Vec<&'a TrackedEntity>
where
    F: Fn(&MetricWindow) -> f64,
{
    let mut scored: Vec<(f64, &TrackedEntity)> = entities
        .iter()
        .filter_map(|e| threshold.value_of(e, metric).map(|v| (v, e)))
        .collect();

    scored.sort_by(|a, b| descending(a.0, b.0).then_with(|| a.1.id.cmp(&b.1.id)));

    scored.into_iter().take(k).map(|(_, e)| e).collect()
}

fn score_entity<F>(entity: &TrackedEntity, windows: &[WindowThreshold], metric: &F) -> RankedEntity
where
    F: Fn(&MetricWindow) -> f64,
{
    let values: Vec<WindowValue> = windows
        .iter()
        .map(|t| WindowValue {
            span: t.span,
            total_events: entity.window(t.span).map(|w| w.total_events).unwrap_or(0),
            value: t.value_of(entity, metric),
        })
        .collect();

    let score = values
        .iter()
        .filter_map(|v| v.value)
        .fold(f64::NEG_INFINITY, f64::max);

    RankedEntity {
        id: entity.id,
        name: entity.display_name(),
        kind: entity.kind,
        score,
        windows: values,
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: u64, five: Option<(u64, f64)>, hour: Option<(u64, f64)>) -> TrackedEntity {
        let mut e = TrackedEntity::new(id, format!("e{}", id), EntityKind::Other);
        if let Some((n, avg)) = five {
            e = e.with_window(WindowSpan::FiveMinutes, MetricWindow::new(n, avg, avg * 2.0));
        }
        if let Some((n, avg)) = hour {
            e = e.with_window(WindowSpan::OneHour, MetricWindow::new(n, avg, avg * 2.0));
        }
        e
    }

    fn both_windows() -> Vec<WindowThreshold> {
        vec![
            WindowThreshold::new(WindowSpan::FiveMinutes, 10),
            WindowThreshold::new(WindowSpan::OneHour, 50),
        ]
    }

    #[test]
    fn test_sparse_window_does_not_count() {
        // Entity 1 has a huge 5m average but only 2 events there
        let entities = vec![
            entity(1, Some((2, 9.0)), Some((100, 0.1))),
            entity(2, Some((20, 0.5)), None),
        ];

        let ranked = rank_by(&entities, &both_windows(), RankMetric::Average, 10);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, EntityId(2));
        assert_eq!(ranked[1].id, EntityId(1));
        assert_eq!(ranked[1].score, 0.1);
        assert_eq!(ranked[1].windows[0].value, None);
        assert_eq!(ranked[1].windows[0].total_events, 2);
    }

    #[test]
    fn test_absent_window_is_not_zero() {
        // Negative metric values must still outrank a missing window
        let entities = vec![
            entity(1, Some((20, -1.0)), None),
            entity(2, None, Some((60, -2.0))),
        ];

        let ranked = rank_by(&entities, &both_windows(), RankMetric::Average, 10);

        assert_eq!(ranked[0].score, -1.0);
        assert_eq!(ranked[1].score, -2.0);
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let entities = vec![
            entity(9, Some((20, 1.0)), None),
            entity(3, Some((20, 1.0)), None),
            entity(5, Some((20, 1.0)), None),
        ];

        let ranked = rank_by(&entities, &both_windows(), RankMetric::Average, 2);

        let ids: Vec<u64> = ranked.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![3, 5]);
    }

    #[test]
    fn test_longest_uses_longest_duration() {
        let entities = vec![entity(1, Some((20, 1.0)), None), entity(2, Some((20, 0.9)), None)];

        let ranked = rank_by(&entities, &both_windows(), RankMetric::Longest, 1);

        assert_eq!(ranked[0].id, EntityId(1));
        assert_eq!(ranked[0].score, 2.0);
    }

    #[test]
    fn test_zero_k_and_empty_input() {
        let entities = vec![entity(1, Some((20, 1.0)), None)];
        assert!(rank_by(&entities, &both_windows(), RankMetric::Average, 0).is_empty());
        assert!(rank_by(&[], &both_windows(), RankMetric::Average, 5).is_empty());
        assert!(rank_by(&entities, &[], RankMetric::Average, 5).is_empty());
    }
}
