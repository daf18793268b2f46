//! sysinfo-based implementation of the process and memory collaborators.

use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System};

use super::runtime::{
    CollectMode, GenerationInfo, HeapStats, MemoryRuntime, ProcessStats, ProcessStatsProvider,
};
use crate::utils::error::SourceError;

/// Reads the current process through the `sysinfo` crate.
///
/// Rust frees memory deterministically, so there is no collector to run and
/// nothing waits for finalization: `collect` only records that a collection
/// was requested and live bytes are the resident set.
pub struct SysinfoProcess {
    system: Mutex<System>,
    pid: Pid,
    collections: AtomicU64,
}

impl SysinfoProcess {
    /// Monitor the process this code runs in
    pub fn current() -> Result<Self, SourceError> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| SourceError::Unavailable(format!("current pid: {}", e)))?;
        Ok(Self {
            system: Mutex::new(System::new()),
            pid,
            collections: AtomicU64::new(0),
        })
    }

    fn with_process<T>(&self, read: impl FnOnce(&Process) -> T) -> Result<T, SourceError> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| SourceError::Unavailable("process stats lock poisoned".to_string()))?;

        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing()
                .with_memory()
                .with_cpu()
                .with_tasks(),
        );

        system
            .process(self.pid)
            .map(read)
            .ok_or_else(|| SourceError::Unavailable(format!("process {} not found", self.pid)))
    }
}

impl ProcessStatsProvider for SysinfoProcess {
    fn process_stats(&self) -> Result<ProcessStats, SourceError> {
        self.with_process(|p| ProcessStats {
            cpu_time_secs: p.accumulated_cpu_time() as f64 / 1000.0,
            working_set_bytes: p.memory(),
            thread_count: p.tasks().map(|t| t.len()),
        })
    }
}

impl MemoryRuntime for SysinfoProcess {
    fn live_bytes(&self) -> Result<u64, SourceError> {
        self.with_process(|p| p.memory())
    }

    fn collect(&self, mode: CollectMode) -> Result<(), SourceError> {
        let n = self.collections.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Collection #{} requested ({:?}); memory is freed on drop", n, mode);
        Ok(())
    }

    fn wait_for_pending_finalizers(&self) -> Result<(), SourceError> {
        Ok(())
    }

    fn heap_stats(&self) -> Result<HeapStats, SourceError> {
        let resident = self.live_bytes()?;
        Ok(HeapStats {
            heap_bytes: resident,
            fragmented_bytes: None,
            pause_durations_ms: Vec::new(),
            generations: vec![GenerationInfo {
                index: 0,
                size_bytes: resident,
                collections: self.collections.load(Ordering::Relaxed),
            }],
        })
    }

    fn max_generation(&self) -> u32 {
        0
    }
}
