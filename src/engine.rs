//! The diagnostics context.
//!
//! Holds every collaborator as an injected, instance-scoped handle. Nothing
//! here is process-global, so tests build an engine over fakes and hosts
//! can run several engines side by side.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::DiagnosticsConfig;
use crate::memory::{
    memory_stats, Baseline, BaselineDiffTracker, BaselineStore, CollectionReport, CountProbe,
    GrowthComparison, LeakCheckReport, MemoryError, MemoryRuntime, MemoryStatsReport, NamedProbe,
    ProcessStatsProvider, SessionBaselines, SessionId, SysinfoProcess,
};
use crate::monitor::{MonitorControl, MonitorSwitch, SamplingMonitor};
use crate::ranking::{
    rank_by, rank_by_load, AdmissionThrottle, LoadEntry, RankMetric, RankedEntity,
    WindowThreshold,
};
use crate::snapshot::{Clock, EntityKind, EntityRegistry, SystemClock};
use crate::spread::{
    analyze_scheduling_spread, delay_samples, SpreadAnalysis, SpreadError, SpreadParams,
};
use crate::tasks::{DeferredTasks, TaskError, TaskHandle};
use crate::utils::error::SourceError;

/// A duration ranking together with what it was computed from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingReport {
    pub generated_at: DateTime<Utc>,
    pub metric: RankMetric,
    pub windows: Vec<WindowThreshold>,
    pub k: usize,
    pub entity_count: usize,
    pub entries: Vec<RankedEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub generated_at: DateTime<Utc>,
    pub category: String,
    pub k: usize,
    pub throttle: AdmissionThrottle,
    pub entity_count: usize,
    pub entries: Vec<LoadEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadReport {
    pub generated_at: DateTime<Utc>,
    pub params: SpreadParams,
    pub analysis: SpreadAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineSetReport {
    pub session: SessionId,
    pub baseline: Baseline,
    /// Bytes of the baseline this one replaced
    pub replaced_bytes: Option<u64>,
}

/// Diagnostics over one set of collaborators
pub struct DiagnosticsEngine {
    config: DiagnosticsConfig,
    registry: Arc<dyn EntityRegistry>,
    clock: Arc<dyn Clock>,
    tracker: BaselineDiffTracker,
    process: Arc<dyn ProcessStatsProvider>,
    probes: Vec<Box<dyn CountProbe>>,
    monitor: MonitorControl,
    tasks: DeferredTasks,
    pending_releases: Arc<Mutex<HashMap<SessionId, TaskHandle>>>,
}

impl DiagnosticsEngine {
    pub fn builder(registry: Arc<dyn EntityRegistry>) -> EngineBuilder {
        EngineBuilder::new(registry)
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    pub fn monitor(&self) -> &MonitorControl {
        &self.monitor
    }

    /// Rank by `metric` over the given windows, from one snapshot
    pub fn rank(
        &self,
        metric: RankMetric,
        windows: Vec<WindowThreshold>,
        k: usize,
    ) -> Result<RankingReport, SourceError> {
        let snapshot = self.registry.snapshot()?;
        let entries = rank_by(&snapshot.entities, &windows, metric, k);
        debug!(
            "Ranked {} of {} entities by {}",
            entries.len(),
            snapshot.len(),
            metric.label()
        );

        Ok(RankingReport {
            generated_at: self.clock.now(),
            metric,
            windows,
            k,
            entity_count: snapshot.len(),
            entries,
        })
    }

    pub fn rank_by_load(&self, category: &str, k: usize) -> Result<LoadReport, SourceError> {
        let snapshot = self.registry.snapshot()?;
        let throttle = self.config.load.throttle;
        let entries = rank_by_load(&snapshot.entities, category, k, &throttle);

        Ok(LoadReport {
            generated_at: self.clock.now(),
            category: category.to_string(),
            k,
            throttle,
            entity_count: snapshot.len(),
            entries,
        })
    }

    pub fn scheduling_spread(&self, params: SpreadParams) -> Result<SpreadReport, EngineError> {
        params.validate()?;
        let snapshot = self.registry.snapshot()?;
        let samples = delay_samples(&snapshot);
        let analysis = analyze_scheduling_spread(&samples, &params)?;
        Ok(SpreadReport {
            generated_at: self.clock.now(),
            params,
            analysis,
        })
    }

    /// Capture a baseline for the session; cancels a pending release
    pub fn set_baseline(&self, session: &SessionId) -> Result<BaselineSetReport, MemoryError> {
        self.resume_session(session);
        let replaced_bytes = self.tracker.store().get(session)?.map(|b| b.captured_bytes);
        let baseline = self.tracker.set_baseline(session)?;
        Ok(BaselineSetReport {
            session: session.clone(),
            baseline,
            replaced_bytes,
        })
    }

    pub fn compare(&self, session: &SessionId) -> Result<GrowthComparison, MemoryError> {
        self.tracker.compare(session)
    }

    pub fn leak_check(&self) -> Result<LeakCheckReport, MemoryError> {
        info!("Running leak check (forced full collection)");
        self.tracker.leak_check(&self.probes)
    }

    pub fn memory_stats(&self) -> MemoryStatsReport {
        memory_stats(self.process.as_ref(), self.tracker.runtime().as_ref())
    }

    pub fn collect(&self, generation: Option<u32>) -> Result<CollectionReport, MemoryError> {
        self.tracker.collect(generation)
    }

    /// Release the session's baseline once `grace` has passed.
    ///
    /// Replaces any release already pending for the session.
    pub fn end_session(&self, session: &SessionId, grace: Duration) -> Result<TaskHandle, TaskError> {
        let store = Arc::clone(self.tracker.store());
        let releases = Arc::clone(&self.pending_releases);
        let target = session.clone();

        // Held across schedule + insert so the release cannot clear its entry first
        let mut pending = lock_releases(&self.pending_releases);
        let handle = self.tasks.schedule(
            format!("release-baseline-{}", session),
            grace,
            move || {
                match store.remove(&target) {
                    Ok(Some(_)) => info!("Released baseline of ended session {}", target),
                    Ok(None) => {}
                    Err(e) => warn!("Failed to release baseline of {}: {}", target, e),
                }
                let mut pending = lock_releases(&releases);
                // A newer release for the same session stays registered
                if pending.get(&target).is_some_and(|h| !h.is_pending()) {
                    pending.remove(&target);
                }
            },
        )?;

        if let Some(previous) = pending.insert(session.clone(), handle.clone()) {
            previous.cancel();
        }
        Ok(handle)
    }

    /// Cancel a pending release; returns whether one was still pending
    pub fn resume_session(&self, session: &SessionId) -> bool {
        lock_releases(&self.pending_releases)
            .remove(session)
            .is_some_and(|handle| handle.cancel())
    }

    /// Cancel every deferred task and wait for the workers
    pub fn shutdown(&self) {
        self.tasks.shutdown();
        debug!("Diagnostics engine shut down");
    }
}

/// Errors from operations that span several collaborators
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Spread(#[from] SpreadError),
}

/// Builds a `DiagnosticsEngine`; collaborators not supplied get defaults
pub struct EngineBuilder {
    registry: Arc<dyn EntityRegistry>,
    config: DiagnosticsConfig,
    runtime: Option<Arc<dyn MemoryRuntime>>,
    process: Option<Arc<dyn ProcessStatsProvider>>,
    store: Arc<dyn BaselineStore>,
    clock: Arc<dyn Clock>,
    monitor: Arc<dyn SamplingMonitor>,
    probes: Vec<Box<dyn CountProbe>>,
    default_probes: bool,
}

impl EngineBuilder {
    pub fn new(registry: Arc<dyn EntityRegistry>) -> Self {
        Self {
            registry,
            config: DiagnosticsConfig::default(),
            runtime: None,
            process: None,
            store: Arc::new(SessionBaselines::new()),
            clock: Arc::new(SystemClock),
            monitor: Arc::new(MonitorSwitch::new()),
            probes: Vec::new(),
            default_probes: false,
        }
    }

    pub fn config(mut self, config: DiagnosticsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn memory_runtime(mut self, runtime: Arc<dyn MemoryRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn process_stats(mut self, process: Arc<dyn ProcessStatsProvider>) -> Self {
        self.process = Some(process);
        self
    }

    pub fn baseline_store(mut self, store: Arc<dyn BaselineStore>) -> Self {
        self.store = store;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn monitor(mut self, monitor: Arc<dyn SamplingMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn probe(mut self, probe: Box<dyn CountProbe>) -> Self {
        self.probes.push(probe);
        self
    }

    /// Add loaded-entity and session-count probes ahead of custom ones
    pub fn with_default_probes(mut self) -> Self {
        self.default_probes = true;
        self
    }

    /// # Errors
    /// * `SourceError` - The default sysinfo collaborator could not be created
    pub fn build(self) -> Result<DiagnosticsEngine, SourceError> {
        let (runtime, process) = match (self.runtime, self.process) {
            (Some(runtime), Some(process)) => (runtime, process),
            (runtime, process) => {
                let local = Arc::new(SysinfoProcess::current()?);
                let local_runtime: Arc<dyn MemoryRuntime> = local.clone();
                let local_process: Arc<dyn ProcessStatsProvider> = local;
                (
                    runtime.unwrap_or(local_runtime),
                    process.unwrap_or(local_process),
                )
            }
        };

        let mut probes = Vec::new();
        if self.default_probes {
            probes.extend(default_probes(&self.registry, &self.store));
        }
        probes.extend(self.probes);

        Ok(DiagnosticsEngine {
            tracker: BaselineDiffTracker::new(
                runtime,
                self.store,
                Arc::clone(&self.clock),
                self.config.memory,
            ),
            clock: self.clock,
            config: self.config,
            registry: self.registry,
            process,
            probes,
            monitor: MonitorControl::new(self.monitor),
            tasks: DeferredTasks::new(),
            pending_releases: Arc::new(Mutex::new(HashMap::new())),
        })
    }
}

fn lock_releases(
    releases: &Mutex<HashMap<SessionId, TaskHandle>>,
) -> MutexGuard<'_, HashMap<SessionId, TaskHandle>> {
    releases.lock().unwrap_or_else(|e| e.into_inner())
}

fn default_probes(
    registry: &Arc<dyn EntityRegistry>,
    store: &Arc<dyn BaselineStore>,
) -> Vec<Box<dyn CountProbe>> {
    let mut probes: Vec<Box<dyn CountProbe>> = Vec::new();

    let all = Arc::clone(registry);
    probes.push(Box::new(NamedProbe::new("entities.loaded", move || {
        Ok(all.snapshot()?.len() as u64)
    })));

    for kind in [EntityKind::Player, EntityKind::Creature] {
        let registry = Arc::clone(registry);
        probes.push(Box::new(NamedProbe::new(
            format!("entities.{}s", kind.as_str()),
            move || Ok(registry.snapshot()?.count_kind(kind) as u64),
        )));
    }

    let store = Arc::clone(store);
    probes.push(Box::new(NamedProbe::new("sessions.with_baseline", move || {
        Ok(store.session_count()? as u64)
    })));

    probes
}
