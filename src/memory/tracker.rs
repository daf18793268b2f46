//! Baseline capture, growth comparison and leak checks.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use super::probe::{read_probes, CountProbe, ProbeReading};
use super::runtime::{force_full_collection, CollectMode, MemoryRuntime};
use super::store::{Baseline, BaselineStore, SessionId};
use super::tier::{safe_percentage, GrowthTier, GrowthTiers};
use super::MemoryError;
use crate::snapshot::Clock;

/// Retained bytes from a single leak check cannot tell a leak from a large
/// working set; only the trend across repeated checks can.
pub const LEAK_CHECK_NOTE: &str = "retained bytes are all live reachable memory, not isolated \
leaked memory; run leak-check repeatedly over time and compare retained bytes to detect a leak";

/// Growth of current memory over a session baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthComparison {
    pub session: SessionId,
    pub baseline_bytes: u64,
    pub current_bytes: u64,

    /// `current - baseline`, negative when memory shrank
    pub growth_bytes: i64,

    pub growth_percent: f64,
    pub captured_at: DateTime<Utc>,
    pub compared_at: DateTime<Utc>,
    pub elapsed_secs: f64,

    /// Absent when no time has elapsed since the baseline
    pub growth_rate_per_hour: Option<f64>,

    pub tier: GrowthTier,
}

/// Result of a baseline-independent leak check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeakCheckReport {
    pub checked_at: DateTime<Utc>,
    pub before_bytes: u64,

    /// Live bytes after the forced collection
    pub retained_bytes: u64,

    /// `before - after`, negative when memory grew during the check
    pub collected_bytes: i64,

    pub probes: Vec<ProbeReading>,
    pub note: &'static str,
}

/// Result of an explicit collection request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CollectionReport {
    pub mode: CollectMode,
    pub before_bytes: u64,
    pub after_bytes: u64,
    pub freed_bytes: i64,
    pub duration_ms: f64,
}

/// Compute growth and tier for a baseline
///
/// **Public** - pure part of `compare`, usable without a runtime
pub fn compute_growth(
    session: &SessionId,
    baseline: &Baseline,
    current_bytes: u64,
    now: DateTime<Utc>,
    tiers: &GrowthTiers,
) -> GrowthComparison {
    let growth_bytes = current_bytes as i64 - baseline.captured_bytes as i64;
    let growth_percent = safe_percentage(growth_bytes, baseline.captured_bytes);
    let elapsed_secs = (now - baseline.captured_at).num_milliseconds().max(0) as f64 / 1000.0;
    let growth_rate_per_hour = if elapsed_secs > 0.0 {
        Some(growth_bytes as f64 / (elapsed_secs / 3600.0))
    } else {
        None
    };

    GrowthComparison {
        session: session.clone(),
        baseline_bytes: baseline.captured_bytes,
        current_bytes,
        growth_bytes,
        growth_percent,
        captured_at: baseline.captured_at,
        compared_at: now,
        elapsed_secs,
        growth_rate_per_hour,
        tier: tiers.classify(growth_percent),
    }
}

/// Per-session memory baselines over an injected runtime, store and clock
pub struct BaselineDiffTracker {
    runtime: Arc<dyn MemoryRuntime>,
    store: Arc<dyn BaselineStore>,
    clock: Arc<dyn Clock>,
    tiers: GrowthTiers,
}

impl BaselineDiffTracker {
    pub fn new(
        runtime: Arc<dyn MemoryRuntime>,
        store: Arc<dyn BaselineStore>,
        clock: Arc<dyn Clock>,
        tiers: GrowthTiers,
    ) -> Self {
        Self {
            runtime,
            store,
            clock,
            tiers,
        }
    }

    pub fn store(&self) -> &Arc<dyn BaselineStore> {
        &self.store
    }

    pub fn runtime(&self) -> &Arc<dyn MemoryRuntime> {
        &self.runtime
    }

    /// Force a full collection and record live bytes as the session baseline.
    ///
    /// Overwrites any earlier baseline of the session.
    pub fn set_baseline(&self, session: &SessionId) -> Result<Baseline, MemoryError> {
        let captured_bytes = force_full_collection(self.runtime.as_ref())?;
        let baseline = Baseline {
            captured_bytes,
            captured_at: self.clock.now(),
        };
        self.store.put(session, baseline)?;

        info!(
            "Baseline for session {} set to {} bytes",
            session, captured_bytes
        );
        Ok(baseline)
    }

    /// Compare current live bytes against the session baseline.
    ///
    /// Current bytes are read without forcing a collection.
    ///
    /// # Errors
    /// * `MemoryError::NoBaseline` - The session never set a baseline
    pub fn compare(&self, session: &SessionId) -> Result<GrowthComparison, MemoryError> {
        let baseline = self
            .store
            .get(session)?
            .ok_or_else(|| MemoryError::NoBaseline(session.clone()))?;
        let current = self.runtime.live_bytes()?;

        let comparison = compute_growth(session, &baseline, current, self.clock.now(), &self.tiers);
        if comparison.tier != GrowthTier::Normal {
            warn!(
                "Session {}: memory grew {:.1}% over baseline ({})",
                session,
                comparison.growth_percent,
                comparison.tier.as_str()
            );
        }
        Ok(comparison)
    }

    /// Drop the session baseline
    pub fn release(&self, session: &SessionId) -> Result<Option<Baseline>, MemoryError> {
        Ok(self.store.remove(session)?)
    }

    /// Sample, force a full collection, sample again, then read every probe
    pub fn leak_check(&self, probes: &[Box<dyn CountProbe>]) -> Result<LeakCheckReport, MemoryError> {
        let before = self.runtime.live_bytes()?;
        let after = force_full_collection(self.runtime.as_ref())?;

        Ok(LeakCheckReport {
            checked_at: self.clock.now(),
            before_bytes: before,
            retained_bytes: after,
            collected_bytes: before as i64 - after as i64,
            probes: read_probes(probes),
            note: LEAK_CHECK_NOTE,
        })
    }

    /// Blocking collection of one generation, or a full collection
    ///
    /// # Errors
    /// * `MemoryError::InvalidGeneration` - Generation above the runtime maximum
    pub fn collect(&self, generation: Option<u32>) -> Result<CollectionReport, MemoryError> {
        let max = self.runtime.max_generation();
        let mode = match generation {
            Some(g) if g > max => {
                return Err(MemoryError::InvalidGeneration { requested: g, max })
            }
            Some(g) => CollectMode::Generation(g),
            None => CollectMode::Full,
        };

        let started = Instant::now();
        let before = self.runtime.live_bytes()?;
        self.runtime.collect(mode)?;
        let after = self.runtime.live_bytes()?;

        Ok(CollectionReport {
            mode,
            before_bytes: before,
            after_bytes: after,
            freed_bytes: before as i64 - after as i64,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }
}
