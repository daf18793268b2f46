//! Fakes shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tickscope::engine::DiagnosticsEngine;
use tickscope::memory::{
    CollectMode, HeapStats, MemoryRuntime, ProcessStats, ProcessStatsProvider, SessionBaselines,
};
use tickscope::snapshot::{
    Clock, EntityKind, MetricWindow, RegistrySnapshot, TrackedEntity, WindowSpan,
};
use tickscope::utils::error::SourceError;

pub const MB: u64 = 1024 * 1024;

/// Memory runtime whose live bytes the test controls
#[derive(Debug, Default)]
pub struct FakeRuntime {
    live: AtomicU64,
    /// Live bytes left after a full collection, when set
    retained: Mutex<Option<u64>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn with_live(bytes: u64) -> Arc<Self> {
        let runtime = Self::default();
        runtime.live.store(bytes, Ordering::SeqCst);
        Arc::new(runtime)
    }

    pub fn set_live(&self, bytes: u64) {
        self.live.store(bytes, Ordering::SeqCst);
    }

    pub fn retain_after_full(&self, bytes: u64) {
        *self.retained.lock().unwrap() = Some(bytes);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl MemoryRuntime for FakeRuntime {
    fn live_bytes(&self) -> Result<u64, SourceError> {
        Ok(self.live.load(Ordering::SeqCst))
    }

    fn collect(&self, mode: CollectMode) -> Result<(), SourceError> {
        let call = match mode {
            CollectMode::Full => "collect:full".to_string(),
            CollectMode::Generation(g) => format!("collect:{}", g),
        };
        self.calls.lock().unwrap().push(call);
        if mode == CollectMode::Full {
            if let Some(retained) = *self.retained.lock().unwrap() {
                self.live.store(retained, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    fn wait_for_pending_finalizers(&self) -> Result<(), SourceError> {
        self.calls.lock().unwrap().push("finalizers".to_string());
        Ok(())
    }

    fn heap_stats(&self) -> Result<HeapStats, SourceError> {
        Err(SourceError::Unsupported("heap statistics".to_string()))
    }

    fn max_generation(&self) -> u32 {
        2
    }
}

pub struct FakeProcess;

impl ProcessStatsProvider for FakeProcess {
    fn process_stats(&self) -> Result<ProcessStats, SourceError> {
        Ok(ProcessStats {
            cpu_time_secs: 12.5,
            working_set_bytes: 256 * MB,
            thread_count: Some(9),
        })
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Engine over a fixed snapshot and fakes, with the default probes
pub fn engine_with(
    snapshot: RegistrySnapshot,
    runtime: Arc<FakeRuntime>,
    clock: Arc<ManualClock>,
) -> DiagnosticsEngine {
    DiagnosticsEngine::builder(Arc::new(snapshot))
        .memory_runtime(runtime)
        .process_stats(Arc::new(FakeProcess))
        .baseline_store(Arc::new(SessionBaselines::new()))
        .clock(clock)
        .with_default_probes()
        .build()
        .unwrap()
}

/// Entity with both windows set: `(events, average, longest)` per window
pub fn timed(
    id: u64,
    five: (u64, f64, f64),
    hour: (u64, f64, f64),
) -> TrackedEntity {
    TrackedEntity::new(id, format!("entity-{}", id), EntityKind::Creature)
        .with_window(WindowSpan::FiveMinutes, MetricWindow::new(five.0, five.1, five.2))
        .with_window(WindowSpan::OneHour, MetricWindow::new(hour.0, hour.1, hour.2))
}

/// Deterministic pseudo-random registry for property checks
pub fn generated_registry(count: u64, seed: u64) -> Vec<TrackedEntity> {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        state >> 33
    };

    (0..count)
        .map(|id| {
            let five_events = next() % 40;
            let hour_events = next() % 200;
            let five_avg = (next() % 1000) as f64 / 10_000.0;
            let hour_avg = (next() % 1000) as f64 / 10_000.0;
            let five_longest = five_avg + (next() % 500) as f64 / 10_000.0;
            let hour_longest = hour_avg + (next() % 500) as f64 / 10_000.0;
            timed(
                id,
                (five_events, five_avg, five_longest),
                (hour_events, hour_avg, hour_longest),
            )
        })
        .collect()
}
