//! Collaborator boundary for entity state and time.
//!
//! The registry is owned by the server and mutated concurrently. Every
//! computation in this crate asks for exactly one snapshot and works on that
//! copy until it is done.

use chrono::{DateTime, Utc};

use super::schema::RegistrySnapshot;
use crate::utils::error::SourceError;

/// Provides point-in-time copies of the tracked entity collection
pub trait EntityRegistry: Send + Sync {
    /// Copy the full entity collection in one consistent read
    fn snapshot(&self) -> Result<RegistrySnapshot, SourceError>;
}

/// A snapshot already in hand is its own registry
impl EntityRegistry for RegistrySnapshot {
    fn snapshot(&self) -> Result<RegistrySnapshot, SourceError> {
        Ok(self.clone())
    }
}

/// Wall clock used for baseline timestamps and elapsed-time math
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// `Utc::now()` backed clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
