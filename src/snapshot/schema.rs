//! Snapshot data model.
//!
//! Everything here is a point-in-time copy handed over by the entity
//! registry. The diagnostics engine reads these values and never mutates them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::utils::config::{FIVE_MINUTES, ONE_HOUR};

/// Opaque entity identifier, ordered for deterministic tie breaking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Rolling window an external monitor aggregates events over
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSpan {
    FiveMinutes,
    OneHour,
}

impl WindowSpan {
    pub const ALL: [WindowSpan; 2] = [WindowSpan::FiveMinutes, WindowSpan::OneHour];

    pub fn duration(self) -> Duration {
        match self {
            WindowSpan::FiveMinutes => FIVE_MINUTES,
            WindowSpan::OneHour => ONE_HOUR,
        }
    }

    /// Short label used in report columns
    pub fn label(self) -> &'static str {
        match self {
            WindowSpan::FiveMinutes => "5m",
            WindowSpan::OneHour => "1h",
        }
    }
}

/// Aggregated event statistics of one entity over one window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricWindow {
    /// Number of events observed in the window
    #[serde(default)]
    pub total_events: u64,

    /// Mean event duration in seconds
    #[serde(default)]
    pub average_duration: f64,

    /// Longest single event duration in seconds
    #[serde(default)]
    pub longest_duration: f64,

    /// Duration of the most recent event in seconds
    #[serde(default)]
    pub last_duration: f64,
}

impl MetricWindow {
    pub fn new(total_events: u64, average_duration: f64, longest_duration: f64) -> Self {
        Self {
            total_events,
            average_duration,
            longest_duration,
            last_duration: average_duration,
        }
    }
}

/// Entity category, tagged once when the entity registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Creature,
    #[default]
    Other,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Creature => "creature",
            EntityKind::Other => "other",
        }
    }
}

/// One entity as seen by the registry at snapshot time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub id: EntityId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub kind: EntityKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<i64>,

    #[serde(default)]
    pub windows: BTreeMap<WindowSpan, MetricWindow>,

    /// Members per category (e.g. "players" -> 120)
    #[serde(default)]
    pub member_counts: BTreeMap<String, u64>,

    /// Next scheduled tick, in server clock seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_tick_at: Option<f64>,
}

impl TrackedEntity {
    pub fn new(id: u64, name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: EntityId(id),
            name: name.into(),
            kind,
            variation_id: None,
            windows: BTreeMap::new(),
            member_counts: BTreeMap::new(),
            next_tick_at: None,
        }
    }

    pub fn with_window(mut self, span: WindowSpan, window: MetricWindow) -> Self {
        self.windows.insert(span, window);
        self
    }

    pub fn with_member_count(mut self, category: impl Into<String>, count: u64) -> Self {
        self.member_counts.insert(category.into(), count);
        self
    }

    pub fn with_next_tick(mut self, at: f64) -> Self {
        self.next_tick_at = Some(at);
        self
    }

    pub fn with_variation(mut self, variation_id: i64) -> Self {
        self.variation_id = Some(variation_id);
        self
    }

    pub fn window(&self, span: WindowSpan) -> Option<&MetricWindow> {
        self.windows.get(&span)
    }

    /// Name plus variation, falling back to the id for unnamed entities
    pub fn display_name(&self) -> String {
        let base = if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        };
        match self.variation_id {
            Some(v) => format!("{} [{}]", base, v),
            None => base,
        }
    }
}

/// The full entity collection, obtained by a single registry call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Server clock at capture time, in seconds
    #[serde(default)]
    pub captured_at: f64,

    #[serde(default)]
    pub entities: Vec<TrackedEntity>,
}

impl RegistrySnapshot {
    pub fn new(captured_at: f64, entities: Vec<TrackedEntity>) -> Self {
        Self {
            captured_at,
            entities,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }
}
