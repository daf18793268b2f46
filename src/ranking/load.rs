//! Load ranking with an admission-delay estimate.
//!
//! Entities with many pending units (members of a category) are served by a
//! fixed-capacity admission queue: `per_tick_limit` units per tick, one tick
//! every `tick_interval_secs`. The projected delay is how long the last unit
//! waits before it is admitted.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::snapshot::{EntityId, EntityKind, TrackedEntity};
use crate::utils::config::{DEFAULT_PER_TICK_LIMIT, DEFAULT_TICK_INTERVAL_SECS};
use crate::utils::error::ConfigError;

/// Per-tick admission control parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdmissionThrottle {
    /// Units admitted per tick
    #[serde(default = "default_per_tick_limit")]
    pub per_tick_limit: u64,

    /// Length of one tick in seconds
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: f64,
}

fn default_per_tick_limit() -> u64 {
    DEFAULT_PER_TICK_LIMIT
}

fn default_tick_interval_secs() -> f64 {
    DEFAULT_TICK_INTERVAL_SECS
}

impl Default for AdmissionThrottle {
    fn default() -> Self {
        Self {
            per_tick_limit: DEFAULT_PER_TICK_LIMIT,
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
        }
    }
}

impl AdmissionThrottle {
    /// Create a validated throttle
    pub fn new(per_tick_limit: u64, tick_interval_secs: f64) -> Result<Self, ConfigError> {
        let throttle = Self {
            per_tick_limit,
            tick_interval_secs,
        };
        throttle.validate()?;
        Ok(throttle)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_tick_limit == 0 {
            return Err(ConfigError::Invalid(
                "per_tick_limit must be greater than 0".to_string(),
            ));
        }
        if !self.tick_interval_secs.is_finite() || self.tick_interval_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tick_interval_secs must be positive, got {}",
                self.tick_interval_secs
            )));
        }
        Ok(())
    }

    /// `ceil(count / per_tick_limit)`
    pub fn ticks_needed(&self, count: u64) -> u64 {
        count.div_ceil(self.per_tick_limit.max(1))
    }

    /// Projected serialization delay for `count` pending units
    pub fn delay_secs(&self, count: u64) -> f64 {
        self.ticks_needed(count) as f64 * self.tick_interval_secs
    }
}

/// One row of a load ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadEntry {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub count: u64,
    pub ticks_needed: u64,
    pub delay_secs: f64,
}

/// Rank entities by their member count in `category`
///
/// **Public** - backs the `rank-by-load` report
///
/// Only entities that report the category take part; no event floor is
/// applied. Descending by count, ties by ascending id, at most `k` rows.
pub fn rank_by_load(
    entities: &[TrackedEntity],
    category: &str,
    k: usize,
    throttle: &AdmissionThrottle,
) -> Vec<LoadEntry> {
    let mut counted: Vec<(u64, &TrackedEntity)> = entities
        .iter()
        .filter_map(|e| e.member_counts.get(category).map(|c| (*c, e)))
        .collect();

    debug!(
        "Load ranking over {} entities reporting '{}'",
        counted.len(),
        category
    );

    counted.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));

    counted
        .into_iter()
        .take(k)
        .map(|(count, e)| LoadEntry {
            id: e.id,
            name: e.display_name(),
            kind: e.kind,
            count,
            ticks_needed: throttle.ticks_needed(count),
            delay_secs: throttle.delay_secs(count),
        })
        .collect()
}
