//! Process and heap statistics report.
//!
//! Each section is read on its own; a failing collaborator costs one line
//! of the report, never the whole report.

use serde::Serialize;

use super::probe::Section;
use super::runtime::{HeapStats, MemoryRuntime, ProcessStats, ProcessStatsProvider};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStatsReport {
    pub process: Section<ProcessStats>,
    pub heap: Section<HeapStats>,
    pub live_bytes: Section<u64>,
    pub max_generation: u32,
}

pub fn memory_stats(
    process: &dyn ProcessStatsProvider,
    runtime: &dyn MemoryRuntime,
) -> MemoryStatsReport {
    MemoryStatsReport {
        process: Section::from_result(process.process_stats()),
        heap: Section::from_result(runtime.heap_stats()),
        live_bytes: Section::from_result(runtime.live_bytes()),
        max_generation: runtime.max_generation(),
    }
}
