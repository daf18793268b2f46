//! Diagnostics operations as string commands.
//!
//! A request is an operation name plus string arguments. Every request
//! yields either one report or one error message; a bad argument never
//! changes any state.

pub mod dispatch;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use dispatch::{execute, respond, run_line, CommandOutput, HelpReport};
pub use models::{Command, CommandUsage, RankArgs, COMMANDS};
pub use utils::{display_version, render_help, validate_snapshot_file};

use thiserror::Error;

use crate::engine::EngineError;
use crate::memory::MemoryError;
use crate::monitor::MonitorError;
use crate::spread::SpreadError;
use crate::utils::error::SourceError;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Empty request; try 'help'")]
    Empty,

    #[error("Unknown command '{0}'; try 'help'")]
    UnknownCommand(String),

    #[error("Missing argument <{arg}> for {command}")]
    MissingArgument {
        command: &'static str,
        arg: &'static str,
    },

    #[error("Too many arguments for {command} (at most {max})")]
    TooManyArguments { command: &'static str, max: usize },

    #[error("Invalid {name} '{value}': {reason}")]
    InvalidArgument {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Spread(#[from] SpreadError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl From<EngineError> for CommandError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Source(e) => CommandError::Source(e),
            EngineError::Spread(e) => CommandError::Spread(e),
        }
    }
}
