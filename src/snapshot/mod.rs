//! Entity snapshots and the collaborator traits that provide them.
//!
//! - `schema`: entities, metric windows, registry snapshot
//! - `source`: registry and clock traits
//! - `file`: JSON snapshot file registry

pub mod file;
pub mod schema;
pub mod source;

pub use file::{read_snapshot, write_snapshot, FileRegistry};
pub use schema::{
    EntityId, EntityKind, MetricWindow, RegistrySnapshot, TrackedEntity, WindowSpan,
};
pub use source::{Clock, EntityRegistry, SystemClock};
