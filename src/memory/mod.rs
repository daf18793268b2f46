//! Memory growth tracking.
//!
//! Compares live memory against a per-session baseline and produces
//! growth tiers, leak-check readings and process/heap statistics.
//!
//! # Example
//! ```ignore
//! let tracker = BaselineDiffTracker::new(runtime, store, clock, GrowthTiers::default());
//! tracker.set_baseline(&session)?;
//! // ... later
//! let growth = tracker.compare(&session)?;
//! println!("{}", growth.tier.as_str());
//! ```

mod probe;
mod runtime;
mod stats;
mod store;
mod sysinfo_impl;
mod tier;
mod tracker;

// Public API exports
pub use probe::{read_probes, CountProbe, NamedProbe, ProbeReading, Section};
pub use runtime::{
    force_full_collection, CollectMode, GenerationInfo, HeapStats, MemoryRuntime, ProcessStats,
    ProcessStatsProvider,
};
pub use stats::{memory_stats, MemoryStatsReport};
pub use store::{Baseline, BaselineStore, SessionBaselines, SessionId};
pub use sysinfo_impl::SysinfoProcess;
pub use tier::{safe_percentage, GrowthTier, GrowthTiers};
pub use tracker::{
    compute_growth, BaselineDiffTracker, CollectionReport, GrowthComparison, LeakCheckReport,
    LEAK_CHECK_NOTE,
};

// Error type
use thiserror::Error;

use crate::utils::error::SourceError;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("No baseline set for session {0}; run baseline-set first")]
    NoBaseline(SessionId),

    #[error("Generation {requested} is out of range (max {max})")]
    InvalidGeneration { requested: u32, max: u32 },

    #[error(transparent)]
    Source(#[from] SourceError),
}
