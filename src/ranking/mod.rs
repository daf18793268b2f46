//! Entity rankings computed from one registry snapshot.
//!
//! This module turns per-entity window statistics into:
//! - Duration rankings merged across windows (by average, by longest)
//! - Load rankings with a projected admission delay

pub mod load;
pub mod merge;

// Re-export main types and functions
pub use load::{rank_by_load, AdmissionThrottle, LoadEntry};
pub use merge::{rank_by, top_k_merged, RankMetric, RankedEntity, WindowThreshold, WindowValue};
