//! Tickscope
//!
//! On-demand diagnostics for live tick-based servers: which entities are
//! slowest or most loaded, whether their next ticks are bunched together,
//! and whether memory keeps growing over a baseline.
//!
//! This crate provides the core implementation for the `tickscope` CLI
//! tool. Hosts embedding the engine build a `DiagnosticsEngine` over their
//! own registry, memory runtime and sampling monitor.
//!
//! ## Getting Started
//!
//! ```bash
//! cargo install tickscope
//! tickscope run --snapshot registry.json rank-by-average
//! tickscope console --snapshot registry.json
//! ```

pub mod commands;
pub mod config;
pub mod engine;
pub mod memory;
pub mod monitor;
pub mod ranking;
pub mod report;
pub mod snapshot;
pub mod spread;
pub mod tasks;
pub mod utils;

pub use commands::{execute, respond, Command, CommandError, CommandOutput};
pub use config::{load_config, load_config_optional, DiagnosticsConfig};
pub use engine::{DiagnosticsEngine, EngineBuilder, EngineError};
pub use memory::SessionId;
