//! Configuration and constants for the diagnostics engine.

use std::time::Duration;

/// Registry snapshot schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Span of the short rolling window
pub const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);

/// Span of the long rolling window
pub const ONE_HOUR: Duration = Duration::from_secs(60 * 60);

// Noise suppression: windows with fewer events produce unstable averages/maxima
pub const DEFAULT_MIN_EVENTS_FIVE_MINUTES: u64 = 10;
pub const DEFAULT_MIN_EVENTS_ONE_HOUR: u64 = 50;

pub const DEFAULT_RANKING_K: usize = 10;
pub const DEFAULT_LOAD_K: usize = 5;
pub const MAX_RANKING_K: usize = 1000;

// Admission control: units admitted per tick and the tick length
pub const DEFAULT_PER_TICK_LIMIT: u64 = 75;
pub const DEFAULT_TICK_INTERVAL_SECS: f64 = 0.3;

// Scheduling spread histogram
pub const DEFAULT_SPREAD_HORIZON_SECS: f64 = 1.0;
pub const DEFAULT_BUCKET_WIDTH_SECS: f64 = 0.05;
pub const DEFAULT_SYNC_THRESHOLD_SECS: f64 = 0.1;
pub const MAX_HISTOGRAM_BUCKETS: usize = 10_000;

// Memory growth tiers (percent over baseline)
pub const DEFAULT_SEVERE_GROWTH_PERCENT: f64 = 50.0;
pub const DEFAULT_CAUTION_GROWTH_PERCENT: f64 = 25.0;

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
