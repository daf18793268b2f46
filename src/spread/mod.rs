//! Scheduling spread analysis.
//!
//! Buckets the delay until each entity's next tick and classifies the
//! distribution as synchronized (an anomaly) or desynchronized (healthy).

mod histogram;

pub use histogram::{
    analyze_scheduling_spread, bucket_index, delay_samples, Bucket, DelaySample, SpreadAnalysis,
    SpreadParams, SpreadStats, SyncClass,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpreadError {
    #[error("Invalid spread parameter: {0}")]
    InvalidParameter(String),
}
