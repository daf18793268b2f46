//! Per-session baseline storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use crate::utils::error::SourceError;

/// Identifies the operator session a baseline belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A captured memory measurement.
///
/// Bytes and timestamp always travel together: stores replace the whole
/// value, so a reader never pairs a new timestamp with an old byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub captured_bytes: u64,
    pub captured_at: DateTime<Utc>,
}

/// Single-slot, last-write-wins baseline per session
pub trait BaselineStore: Send + Sync {
    fn get(&self, session: &SessionId) -> Result<Option<Baseline>, SourceError>;

    /// Replace any existing baseline for the session
    fn put(&self, session: &SessionId, baseline: Baseline) -> Result<(), SourceError>;

    /// Drop the session's baseline, returning it if there was one
    fn remove(&self, session: &SessionId) -> Result<Option<Baseline>, SourceError>;

    fn session_count(&self) -> Result<usize, SourceError>;
}

/// In-memory `BaselineStore`
#[derive(Debug, Default)]
pub struct SessionBaselines {
    slots: Mutex<HashMap<SessionId, Baseline>>,
}

impl SessionBaselines {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, Baseline>>, SourceError> {
        self.slots
            .lock()
            .map_err(|_| SourceError::Unavailable("baseline store lock poisoned".to_string()))
    }
}

impl BaselineStore for SessionBaselines {
    fn get(&self, session: &SessionId) -> Result<Option<Baseline>, SourceError> {
        Ok(self.slots()?.get(session).copied())
    }

    fn put(&self, session: &SessionId, baseline: Baseline) -> Result<(), SourceError> {
        self.slots()?.insert(session.clone(), baseline);
        Ok(())
    }

    fn remove(&self, session: &SessionId) -> Result<Option<Baseline>, SourceError> {
        Ok(self.slots()?.remove(session))
    }

    fn session_count(&self) -> Result<usize, SourceError> {
        Ok(self.slots()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_last_write_wins() {
        let store = SessionBaselines::new();
        let session = SessionId::new("ops");
        let first = Baseline {
            captured_bytes: 10,
            captured_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        };
        let second = Baseline {
            captured_bytes: 20,
            captured_at: Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap(),
        };

        store.put(&session, first).unwrap();
        store.put(&session, second).unwrap();

        assert_eq!(store.get(&session).unwrap(), Some(second));
        assert_eq!(store.session_count().unwrap(), 1);
        assert_eq!(store.remove(&session).unwrap(), Some(second));
        assert_eq!(store.get(&session).unwrap(), None);
    }
}
