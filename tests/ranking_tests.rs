mod common;

use common::{engine_with, generated_registry, timed, FakeRuntime, ManualClock};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use tickscope::ranking::{rank_by, rank_by_load, AdmissionThrottle, RankMetric, WindowThreshold};
use tickscope::snapshot::{
    EntityId, EntityKind, MetricWindow, RegistrySnapshot, TrackedEntity, WindowSpan,
};
use tickscope::{respond, SessionId};

fn windows(min_five: u64, min_hour: u64) -> Vec<WindowThreshold> {
    vec![
        WindowThreshold::new(WindowSpan::FiveMinutes, min_five),
        WindowThreshold::new(WindowSpan::OneHour, min_hour),
    ]
}

/// Ids of the top `k` of one window, computed independently of the merge
fn single_window_top(
    entities: &[TrackedEntity],
    threshold: &WindowThreshold,
    metric: RankMetric,
    k: usize,
) -> Vec<EntityId> {
    let mut scored: Vec<(f64, EntityId)> = entities
        .iter()
        .filter_map(|e| {
            e.window(threshold.span)
                .filter(|w| w.total_events >= threshold.min_events)
                .map(|w| (metric.extract(w), e.id))
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    scored.into_iter().take(k).map(|(_, id)| id).collect()
}

#[test]
fn test_merged_ranking_properties_hold_over_generated_registries() {
    for seed in 1..=8 {
        let entities = generated_registry(120, seed);
        for metric in [RankMetric::Average, RankMetric::Longest] {
            for k in [1, 3, 10, 50] {
                let thresholds = windows(10, 50);
                let ranked = rank_by(&entities, &thresholds, metric, k);

                assert!(ranked.len() <= k);

                let union: BTreeSet<EntityId> = thresholds
                    .iter()
                    .flat_map(|t| single_window_top(&entities, t, metric, k))
                    .collect();
                for entry in &ranked {
                    assert!(union.contains(&entry.id), "seed {} id {}", seed, entry.id);
                }

                for pair in ranked.windows(2) {
                    assert!(pair[0].score >= pair[1].score);
                }

                // Score is the best value among windows the entity qualifies for
                for entry in &ranked {
                    let best = entry
                        .windows
                        .iter()
                        .filter_map(|w| w.value)
                        .fold(f64::NEG_INFINITY, f64::max);
                    assert_eq!(entry.score, best);
                }
            }
        }
    }
}

#[test]
fn test_window_under_floor_never_counts_as_zero() {
    // Entity 1 is slow but only over the hour; its 5m window is under the floor.
    let entities = vec![
        timed(1, (2, 9.0, 9.0), (100, 0.4, 0.5)),
        timed(2, (20, 0.3, 0.3), (100, 0.2, 0.2)),
    ];

    let ranked = rank_by(&entities, &windows(10, 50), RankMetric::Average, 10);

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].id, EntityId(1));
    assert_eq!(ranked[0].score, 0.4);
    assert_eq!(ranked[0].windows[0].value, None);
    assert_eq!(ranked[0].windows[0].total_events, 2);
}

#[test]
fn test_entity_missing_one_window() {
    let only_hour = TrackedEntity::new(5, "boss", EntityKind::Creature)
        .with_window(WindowSpan::OneHour, MetricWindow::new(80, 0.05, 0.9));
    let entities = vec![only_hour, timed(6, (15, 0.01, 0.02), (60, 0.01, 0.03))];

    let ranked = rank_by(&entities, &windows(10, 50), RankMetric::Longest, 10);

    assert_eq!(ranked[0].id, EntityId(5));
    assert_eq!(ranked[0].score, 0.9);
}

#[test]
fn test_ties_break_by_ascending_id() {
    let entities = vec![
        timed(9, (20, 0.1, 0.1), (60, 0.1, 0.1)),
        timed(3, (20, 0.1, 0.1), (60, 0.1, 0.1)),
        timed(6, (20, 0.1, 0.1), (60, 0.1, 0.1)),
    ];

    let ranked = rank_by(&entities, &windows(10, 50), RankMetric::Average, 2);
    let ids: Vec<EntityId> = ranked.iter().map(|r| r.id).collect();

    assert_eq!(ids, vec![EntityId(3), EntityId(6)]);
}

#[test]
fn test_nothing_over_the_floor_is_empty() {
    let entities = vec![timed(1, (1, 0.5, 0.5), (1, 0.5, 0.5))];
    assert!(rank_by(&entities, &windows(10, 50), RankMetric::Average, 10).is_empty());
    assert!(rank_by(&[], &windows(0, 0), RankMetric::Average, 10).is_empty());
}

#[test]
fn test_rank_by_load_orders_and_projects_delay() {
    let throttle = AdmissionThrottle::new(75, 0.3).unwrap();
    let entities = vec![
        TrackedEntity::new(1, "lobby", EntityKind::Other).with_member_count("spectators", 150),
        TrackedEntity::new(2, "arena", EntityKind::Other).with_member_count("spectators", 300),
        TrackedEntity::new(3, "market", EntityKind::Other).with_member_count("traders", 900),
        TrackedEntity::new(4, "docks", EntityKind::Other).with_member_count("spectators", 150),
    ];

    let ranked = rank_by_load(&entities, "spectators", 5, &throttle);
    let ids: Vec<EntityId> = ranked.iter().map(|r| r.id).collect();

    assert_eq!(ids, vec![EntityId(2), EntityId(1), EntityId(4)]);
    assert_eq!(ranked[1].ticks_needed, 2);
    assert!((ranked[1].delay_secs - 0.6).abs() < 1e-9);
    assert_eq!(ranked[0].ticks_needed, 4);

    assert_eq!(rank_by_load(&entities, "spectators", 1, &throttle).len(), 1);
    assert!(rank_by_load(&entities, "guards", 5, &throttle).is_empty());
}

#[test]
fn test_ranking_through_the_engine_uses_configured_floors() {
    colored::control::set_override(false);
    let snapshot = RegistrySnapshot::new(
        0.0,
        vec![
            timed(1, (12, 0.020, 0.050), (60, 0.010, 0.090)),
            timed(2, (5, 0.900, 0.950), (10, 0.900, 0.950)),
        ],
    );
    let engine = engine_with(snapshot, FakeRuntime::with_live(0), ManualClock::new());
    let session = SessionId::new("ops");

    let text = respond(&engine, &session, "rank-by-average");
    assert!(text.contains("Top 10 by average duration"));
    assert!(text.contains("entity-1 #1"));
    assert!(!text.contains("entity-2 #2"));

    // Lowering the floors lets entity 2 in, ahead of entity 1
    let text = respond(&engine, &session, "rank-by-average 1 1 1");
    assert!(text.contains("Top 1 by average duration"));
    assert!(text.contains("entity-2 #2"));
    assert!(!text.contains("entity-1 #1"));

    let text = respond(&engine, &session, "rank-by-longest 100 100");
    assert!(text.contains("No data"));
}
