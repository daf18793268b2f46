//! Collaborator boundary for process and heap memory.
//!
//! The engine never decides *when* to collect; it only forces a collection
//! when an operator explicitly asks for a baseline, a leak check or a
//! collection. The runtime behind the trait owns the mechanics.

use log::debug;
use serde::Serialize;
use std::time::Instant;

use crate::utils::error::SourceError;

/// Scope of a requested collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectMode {
    Full,
    Generation(u32),
}

/// Size and collection count of one heap generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationInfo {
    pub index: u32,
    pub size_bytes: u64,
    pub collections: u64,
}

/// Heap statistics as reported by the runtime
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HeapStats {
    pub heap_bytes: u64,

    /// Bytes lost to fragmentation, when the runtime tracks it
    pub fragmented_bytes: Option<u64>,

    /// Recent collection pauses in milliseconds, newest last
    pub pause_durations_ms: Vec<f64>,

    pub generations: Vec<GenerationInfo>,
}

impl HeapStats {
    pub fn fragmentation_percent(&self) -> Option<f64> {
        let fragmented = self.fragmented_bytes?;
        if self.heap_bytes == 0 {
            return Some(0.0);
        }
        Some(fragmented as f64 / self.heap_bytes as f64 * 100.0)
    }

    pub fn total_pause_ms(&self) -> f64 {
        self.pause_durations_ms.iter().sum()
    }
}

/// Memory runtime of the host process
pub trait MemoryRuntime: Send + Sync {
    /// Live bytes without forcing a collection (fast, approximate)
    fn live_bytes(&self) -> Result<u64, SourceError>;

    /// Run one blocking collection
    fn collect(&self, mode: CollectMode) -> Result<(), SourceError>;

    /// Block until objects queued for deferred finalization are finalized
    fn wait_for_pending_finalizers(&self) -> Result<(), SourceError>;

    fn heap_stats(&self) -> Result<HeapStats, SourceError>;

    /// Highest generation index accepted by `collect`
    fn max_generation(&self) -> u32;
}

/// Reclaim everything reclaimable, then sample live bytes.
///
/// Full collection, wait for deferred finalization, full collection again:
/// objects released by finalizers are only reclaimable on the second pass.
/// Blocks the caller and touches the whole process.
pub fn force_full_collection(runtime: &dyn MemoryRuntime) -> Result<u64, SourceError> {
    let started = Instant::now();

    runtime.collect(CollectMode::Full)?;
    runtime.wait_for_pending_finalizers()?;
    runtime.collect(CollectMode::Full)?;
    let live = runtime.live_bytes()?;

    debug!(
        "Forced full collection finished in {:.1}ms, {} live bytes",
        started.elapsed().as_secs_f64() * 1000.0,
        live
    );
    Ok(live)
}

/// CPU, working set and thread counters of the host process
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProcessStats {
    pub cpu_time_secs: f64,
    pub working_set_bytes: u64,

    /// Not every platform exposes per-process threads
    pub thread_count: Option<usize>,
}

pub trait ProcessStatsProvider: Send + Sync {
    fn process_stats(&self) -> Result<ProcessStats, SourceError>;
}
