//! In-process `SamplingMonitor` state holder.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::{MonitorMode, SamplingMonitor};
use crate::utils::error::SourceError;

/// Tracks which sampling modes run and since when.
///
/// Hosts that drive their own sampling loop can wrap this and start/stop
/// the loop alongside the switch.
#[derive(Debug, Default)]
pub struct MonitorSwitch {
    running: Mutex<BTreeMap<MonitorMode, DateTime<Utc>>>,
    resets: AtomicU64,
}

impl MonitorSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_at(&self, mode: MonitorMode) -> Option<DateTime<Utc>> {
        self.running.lock().ok()?.get(&mode).copied()
    }

    pub fn reset_count(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }

    fn running(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<MonitorMode, DateTime<Utc>>>, SourceError> {
        self.running
            .lock()
            .map_err(|_| SourceError::Unavailable("monitor state lock poisoned".to_string()))
    }
}

impl SamplingMonitor for MonitorSwitch {
    fn is_running(&self, mode: MonitorMode) -> bool {
        self.running
            .lock()
            .map(|r| r.contains_key(&mode))
            .unwrap_or(false)
    }

    fn start(&self, mode: MonitorMode) -> Result<(), SourceError> {
        self.running()?.entry(mode).or_insert_with(Utc::now);
        Ok(())
    }

    fn stop(&self, mode: MonitorMode) -> Result<(), SourceError> {
        self.running()?.remove(&mode);
        Ok(())
    }

    fn reset(&self) -> Result<(), SourceError> {
        self.resets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
