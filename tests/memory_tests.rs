mod common;

use chrono::Duration;
use common::{engine_with, FakeRuntime, ManualClock, MB};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;
use tickscope::engine::DiagnosticsEngine;
use tickscope::memory::{
    GrowthTier, MemoryError, NamedProbe, Section, SessionBaselines, LEAK_CHECK_NOTE,
};
use tickscope::snapshot::{EntityKind, RegistrySnapshot, TrackedEntity};
use tickscope::utils::error::SourceError;
use tickscope::SessionId;

fn registry() -> RegistrySnapshot {
    RegistrySnapshot::new(
        0.0,
        vec![
            TrackedEntity::new(1, "alice", EntityKind::Player),
            TrackedEntity::new(2, "wolf", EntityKind::Creature),
            TrackedEntity::new(3, "wolf", EntityKind::Creature),
        ],
    )
}

#[test]
fn test_growth_tiers_over_a_session_baseline() {
    let cases = [
        (1600, GrowthTier::Severe, 60.0),
        (1300, GrowthTier::Caution, 30.0),
        (1100, GrowthTier::Normal, 10.0),
        (900, GrowthTier::Normal, -10.0),
    ];

    for (current_mb, tier, percent) in cases {
        let runtime = FakeRuntime::with_live(1000 * MB);
        let engine = engine_with(registry(), runtime.clone(), ManualClock::new());
        let session = SessionId::new("ops");

        engine.set_baseline(&session).unwrap();
        runtime.set_live(current_mb * MB);
        let growth = engine.compare(&session).unwrap();

        assert_eq!(growth.tier, tier, "{} MB", current_mb);
        assert!((growth.growth_percent - percent).abs() < 1e-9);
        assert_eq!(growth.baseline_bytes, 1000 * MB);
        assert_eq!(growth.current_bytes, current_mb * MB);
    }
}

#[test]
fn test_growth_rate_needs_elapsed_time() {
    let runtime = FakeRuntime::with_live(1000 * MB);
    let clock = ManualClock::new();
    let engine = engine_with(registry(), runtime.clone(), clock.clone());
    let session = SessionId::new("ops");

    engine.set_baseline(&session).unwrap();
    runtime.set_live(1100 * MB);
    assert_eq!(engine.compare(&session).unwrap().growth_rate_per_hour, None);

    clock.advance(Duration::minutes(30));
    let growth = engine.compare(&session).unwrap();
    assert_eq!(growth.elapsed_secs, 1800.0);
    assert_eq!(growth.growth_rate_per_hour, Some((200 * MB) as f64));
}

#[test]
fn test_compare_without_baseline() {
    let engine = engine_with(registry(), FakeRuntime::with_live(MB), ManualClock::new());

    let err = engine.compare(&SessionId::new("nobody")).unwrap_err();
    assert!(matches!(err, MemoryError::NoBaseline(ref s) if s.0 == "nobody"));
}

#[test]
fn test_baselines_are_per_session_and_last_write_wins() {
    let runtime = FakeRuntime::with_live(100 * MB);
    let engine = engine_with(registry(), runtime.clone(), ManualClock::new());
    let ops = SessionId::new("ops");
    let dev = SessionId::new("dev");

    engine.set_baseline(&ops).unwrap();
    runtime.set_live(200 * MB);
    let report = engine.set_baseline(&dev).unwrap();
    assert_eq!(report.replaced_bytes, None);

    let report = engine.set_baseline(&ops).unwrap();
    assert_eq!(report.replaced_bytes, Some(100 * MB));
    assert_eq!(report.baseline.captured_bytes, 200 * MB);

    runtime.set_live(300 * MB);
    assert_eq!(engine.compare(&ops).unwrap().baseline_bytes, 200 * MB);
    assert_eq!(engine.compare(&dev).unwrap().baseline_bytes, 200 * MB);
}

#[test]
fn test_baseline_forces_collect_finalize_collect() {
    let runtime = FakeRuntime::with_live(500 * MB);
    runtime.retain_after_full(400 * MB);
    let engine = engine_with(registry(), runtime.clone(), ManualClock::new());

    let report = engine.set_baseline(&SessionId::new("ops")).unwrap();

    assert_eq!(runtime.calls(), vec!["collect:full", "finalizers", "collect:full"]);
    assert_eq!(report.baseline.captured_bytes, 400 * MB);
}

#[test]
fn test_leak_check_reads_probes_independently() {
    let runtime = FakeRuntime::with_live(500 * MB);
    runtime.retain_after_full(420 * MB);
    let engine = DiagnosticsEngine::builder(Arc::new(registry()))
        .memory_runtime(runtime.clone())
        .process_stats(Arc::new(common::FakeProcess))
        .clock(ManualClock::new())
        .with_default_probes()
        .probe(Box::new(NamedProbe::new("cache.broken", || {
            Err(SourceError::Unavailable("cache offline".to_string()))
        })))
        .probe(Box::new(NamedProbe::new("cache.items", || Ok(17))))
        .build()
        .unwrap();

    let report = engine.leak_check().unwrap();

    assert_eq!(report.before_bytes, 500 * MB);
    assert_eq!(report.retained_bytes, 420 * MB);
    assert_eq!(report.collected_bytes, (80 * MB) as i64);
    assert_eq!(report.note, LEAK_CHECK_NOTE);

    let readings: Vec<(&str, &Section<u64>)> = report
        .probes
        .iter()
        .map(|p| (p.name.as_str(), &p.value))
        .collect();
    assert_eq!(
        readings,
        vec![
            ("entities.loaded", &Section::Value(3)),
            ("entities.players", &Section::Value(1)),
            ("entities.creatures", &Section::Value(2)),
            ("sessions.with_baseline", &Section::Value(0)),
            (
                "cache.broken",
                &Section::Error("collaborator unavailable: cache offline".to_string())
            ),
            ("cache.items", &Section::Value(17)),
        ]
    );
}

#[test]
fn test_collect_validates_generation() {
    let runtime = FakeRuntime::with_live(10 * MB);
    let engine = engine_with(registry(), runtime.clone(), ManualClock::new());

    let report = engine.collect(Some(1)).unwrap();
    assert_eq!(report.before_bytes, 10 * MB);
    assert_eq!(runtime.calls(), vec!["collect:1"]);

    assert!(matches!(
        engine.collect(Some(3)),
        Err(MemoryError::InvalidGeneration { requested: 3, max: 2 })
    ));
    assert_eq!(runtime.calls().len(), 1);
}

#[test]
fn test_memory_stats_keeps_failed_sections_local() {
    let engine = engine_with(registry(), FakeRuntime::with_live(64 * MB), ManualClock::new());

    let stats = engine.memory_stats();

    assert_eq!(stats.live_bytes, Section::Value(64 * MB));
    assert!(stats.heap.is_error());
    assert_eq!(stats.process.value().map(|p| p.thread_count), Some(Some(9)));
    assert_eq!(stats.max_generation, 2);
}

#[test]
fn test_ended_session_releases_baseline_after_grace() {
    let store = Arc::new(SessionBaselines::new());
    let engine = DiagnosticsEngine::builder(Arc::new(registry()))
        .memory_runtime(FakeRuntime::with_live(MB))
        .process_stats(Arc::new(common::FakeProcess))
        .baseline_store(store.clone())
        .build()
        .unwrap();
    let session = SessionId::new("ops");

    engine.set_baseline(&session).unwrap();
    engine
        .end_session(&session, StdDuration::from_millis(20))
        .unwrap();

    let mut released = false;
    for _ in 0..200 {
        if tickscope::memory::BaselineStore::session_count(store.as_ref()).unwrap() == 0 {
            released = true;
            break;
        }
        thread::sleep(StdDuration::from_millis(10));
    }
    assert!(released);
    assert!(matches!(
        engine.compare(&session),
        Err(MemoryError::NoBaseline(_))
    ));
}

#[test]
fn test_resumed_session_keeps_baseline() {
    let engine = engine_with(registry(), FakeRuntime::with_live(MB), ManualClock::new());
    let session = SessionId::new("ops");

    engine.set_baseline(&session).unwrap();
    engine
        .end_session(&session, StdDuration::from_millis(50))
        .unwrap();
    assert!(engine.resume_session(&session));
    assert!(!engine.resume_session(&session));

    thread::sleep(StdDuration::from_millis(150));
    assert!(engine.compare(&session).is_ok());
}

#[test]
fn test_shutdown_cancels_pending_releases() {
    let engine = engine_with(registry(), FakeRuntime::with_live(MB), ManualClock::new());
    let session = SessionId::new("ops");

    engine.set_baseline(&session).unwrap();
    engine
        .end_session(&session, StdDuration::from_millis(50))
        .unwrap();
    engine.shutdown();

    thread::sleep(StdDuration::from_millis(150));
    assert!(engine.compare(&session).is_ok());
    assert!(engine
        .end_session(&session, StdDuration::from_millis(1))
        .is_err());
}

#[test]
fn test_resume_after_release_reports_nothing_pending() {
    let store = Arc::new(SessionBaselines::new());
    let engine = DiagnosticsEngine::builder(Arc::new(registry()))
        .memory_runtime(FakeRuntime::with_live(MB))
        .process_stats(Arc::new(common::FakeProcess))
        .baseline_store(store.clone())
        .build()
        .unwrap();
    let session = SessionId::new("ops");

    engine.set_baseline(&session).unwrap();
    let handle = engine
        .end_session(&session, StdDuration::from_millis(10))
        .unwrap();

    for _ in 0..200 {
        if tickscope::memory::BaselineStore::session_count(store.as_ref()).unwrap() == 0 {
            break;
        }
        thread::sleep(StdDuration::from_millis(10));
    }
    // Joins the release worker so its bookkeeping is done
    engine.shutdown();

    assert!(!handle.is_pending());
    assert!(!engine.resume_session(&session));
    assert!(!handle.cancel());
}
