//! Fixed-width histogram of scheduling delays.
//!
//! Entities are expected to have their next tick spread across the tick
//! interval. When every delay lands in a narrow band the entities tick in
//! lockstep and the load arrives as one spike at each tick boundary.

use log::debug;
use serde::{Deserialize, Serialize};

use super::SpreadError;
use crate::snapshot::{EntityId, RegistrySnapshot};
use crate::utils::config::{
    DEFAULT_BUCKET_WIDTH_SECS, DEFAULT_SPREAD_HORIZON_SECS, DEFAULT_SYNC_THRESHOLD_SECS,
    MAX_HISTOGRAM_BUCKETS,
};

/// Parameters for one spread analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadParams {
    /// Delays beyond this many seconds are discarded
    #[serde(default = "default_horizon")]
    pub horizon_secs: f64,

    /// Width of each histogram bucket in seconds
    #[serde(default = "default_bucket_width")]
    pub bucket_width_secs: f64,

    /// Spreads strictly below this are classified as synchronized
    #[serde(default = "default_sync_threshold")]
    pub sync_threshold_secs: f64,
}

fn default_horizon() -> f64 {
    DEFAULT_SPREAD_HORIZON_SECS
}

fn default_bucket_width() -> f64 {
    DEFAULT_BUCKET_WIDTH_SECS
}

fn default_sync_threshold() -> f64 {
    DEFAULT_SYNC_THRESHOLD_SECS
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            horizon_secs: DEFAULT_SPREAD_HORIZON_SECS,
            bucket_width_secs: DEFAULT_BUCKET_WIDTH_SECS,
            sync_threshold_secs: DEFAULT_SYNC_THRESHOLD_SECS,
        }
    }
}

impl SpreadParams {
    pub fn validate(&self) -> Result<(), SpreadError> {
        let finite = self.horizon_secs.is_finite()
            && self.bucket_width_secs.is_finite()
            && self.sync_threshold_secs.is_finite();
        if !finite {
            return Err(SpreadError::InvalidParameter(
                "horizon, bucket width and sync threshold must be finite".to_string(),
            ));
        }
        if self.horizon_secs <= 0.0 {
            return Err(SpreadError::InvalidParameter(format!(
                "horizon must be positive, got {}",
                self.horizon_secs
            )));
        }
        if self.bucket_width_secs <= 0.0 || self.bucket_width_secs > self.horizon_secs {
            return Err(SpreadError::InvalidParameter(format!(
                "bucket width must be in (0, {}], got {}",
                self.horizon_secs, self.bucket_width_secs
            )));
        }
        let buckets = (self.horizon_secs / self.bucket_width_secs - 1e-9).ceil();
        if !buckets.is_finite() || buckets > MAX_HISTOGRAM_BUCKETS as f64 {
            return Err(SpreadError::InvalidParameter(format!(
                "horizon {} / bucket width {} needs more than {} buckets",
                self.horizon_secs, self.bucket_width_secs, MAX_HISTOGRAM_BUCKETS
            )));
        }
        if self.sync_threshold_secs < 0.0 {
            return Err(SpreadError::InvalidParameter(format!(
                "sync threshold must not be negative, got {}",
                self.sync_threshold_secs
            )));
        }
        Ok(())
    }

    /// Number of buckets covering `[0, horizon]`
    pub fn bucket_count(&self) -> usize {
        let ratio = self.horizon_secs / self.bucket_width_secs;
        ((ratio - 1e-9).ceil() as usize).max(1)
    }
}

/// Delay until one entity's next scheduled tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DelaySample {
    pub entity_id: EntityId,
    pub delay_secs: f64,
}

/// Derive delay samples from a snapshot, relative to its capture time
pub fn delay_samples(snapshot: &RegistrySnapshot) -> Vec<DelaySample> {
    snapshot
        .entities
        .iter()
        .filter_map(|e| {
            e.next_tick_at.map(|at| DelaySample {
                entity_id: e.id,
                delay_secs: at - snapshot.captured_at,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncClass {
    /// Scheduling anomaly: entities tick together
    Synchronized,
    /// Healthy: ticks are spread out
    Desynchronized,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucket {
    pub lower_secs: f64,
    pub upper_secs: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadStats {
    /// Samples inside `[0, horizon]`
    pub sample_count: usize,

    /// Samples outside `[0, horizon]`
    pub discarded: usize,

    pub min_secs: f64,
    pub max_secs: f64,
    pub mean_secs: f64,
    pub spread_secs: f64,
    pub classification: SyncClass,

    /// Single-sample input: spread is 0 by construction
    pub degenerate: bool,

    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpreadAnalysis {
    /// Nothing in range; no statistics are computed
    NoData { discarded: usize },
    Analyzed(SpreadStats),
}

/// Bucket and classify scheduling delays
///
/// **Public** - backs the `analyze-scheduling-spread` report
///
/// # Errors
/// * `SpreadError::InvalidParameter` - Parameters fail validation
pub fn analyze_scheduling_spread(
    samples: &[DelaySample],
    params: &SpreadParams,
) -> Result<SpreadAnalysis, SpreadError> {
    params.validate()?;

    let horizon = params.horizon_secs;
    let delays: Vec<f64> = samples
        .iter()
        .map(|s| s.delay_secs)
        .filter(|d| *d >= 0.0 && *d <= horizon)
        .collect();
    let discarded = samples.len() - delays.len();

    debug!(
        "Spread analysis: {} samples in range, {} discarded",
        delays.len(),
        discarded
    );

    if delays.is_empty() {
        return Ok(SpreadAnalysis::NoData { discarded });
    }

    let width = params.bucket_width_secs;
    let n = params.bucket_count();
    let mut buckets: Vec<Bucket> = (0..n)
        .map(|i| Bucket {
            lower_secs: i as f64 * width,
            upper_secs: if i + 1 == n {
                horizon
            } else {
                (i + 1) as f64 * width
            },
            count: 0,
        })
        .collect();

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &d in &delays {
        buckets[bucket_index(d, width, n)].count += 1;
        min = min.min(d);
        max = max.max(d);
        sum += d;
    }

    let spread = max - min;
    let classification = if spread < params.sync_threshold_secs {
        SyncClass::Synchronized
    } else {
        SyncClass::Desynchronized
    };

    Ok(SpreadAnalysis::Analyzed(SpreadStats {
        sample_count: delays.len(),
        discarded,
        min_secs: min,
        max_secs: max,
        mean_secs: sum / delays.len() as f64,
        spread_secs: spread,
        classification,
        degenerate: delays.len() == 1,
        buckets,
    }))
}

/// Bucket for a delay `d >= 0`: `min(floor(d / w), n - 1)`, nudged so that
/// `i * w <= d < (i + 1) * w` holds in floating point. The last bucket also
/// takes everything at or past its lower edge.
pub fn bucket_index(d: f64, width: f64, n: usize) -> usize {
    let last = n.saturating_sub(1);
    let mut i = ((d / width).floor().max(0.0) as usize).min(last);
    while i > 0 && i as f64 * width > d {
        i -= 1;
    }
    while i < last && (i + 1) as f64 * width <= d {
        i += 1;
    }
    i
}
