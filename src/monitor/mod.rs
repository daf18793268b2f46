//! Start/stop control of the external sampling monitor.
//!
//! The periodic sampling loop lives in the host server. This module only
//! validates requests against the monitor's state and forwards them.

mod switch;

pub use switch::MonitorSwitch;

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::utils::error::SourceError;

/// Sampling mode: `normal` restarts counts per interval, `cumulative` keeps them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorMode {
    Normal,
    Cumulative,
}

impl MonitorMode {
    pub const ALL: [MonitorMode; 2] = [MonitorMode::Normal, MonitorMode::Cumulative];

    pub fn as_str(self) -> &'static str {
        match self {
            MonitorMode::Normal => "normal",
            MonitorMode::Cumulative => "cumulative",
        }
    }
}

impl fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitorMode {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(MonitorMode::Normal),
            "cumulative" => Ok(MonitorMode::Cumulative),
            other => Err(MonitorError::UnknownMode(other.to_string())),
        }
    }
}

/// The host's sampling monitor
pub trait SamplingMonitor: Send + Sync {
    fn is_running(&self, mode: MonitorMode) -> bool;
    fn start(&self, mode: MonitorMode) -> Result<(), SourceError>;
    fn stop(&self, mode: MonitorMode) -> Result<(), SourceError>;

    /// Discard everything sampled so far
    fn reset(&self) -> Result<(), SourceError>;
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Unknown monitor mode '{0}' (expected normal or cumulative)")]
    UnknownMode(String),

    #[error("The {0} monitor is already running")]
    AlreadyRunning(MonitorMode),

    #[error("The {0} monitor is not running")]
    NotRunning(MonitorMode),

    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorAction {
    Started,
    Stopped,
    Reset,
}

/// Outcome of a control request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorStatus {
    pub action: MonitorAction,
    pub mode: Option<MonitorMode>,
    pub running: Vec<MonitorMode>,
}

/// Validating front for a `SamplingMonitor`
pub struct MonitorControl {
    monitor: Arc<dyn SamplingMonitor>,
}

impl MonitorControl {
    pub fn new(monitor: Arc<dyn SamplingMonitor>) -> Self {
        Self { monitor }
    }

    pub fn start(&self, mode: MonitorMode) -> Result<MonitorStatus, MonitorError> {
        if self.monitor.is_running(mode) {
            return Err(MonitorError::AlreadyRunning(mode));
        }
        self.monitor.start(mode)?;
        info!("Started {} monitor", mode);
        Ok(self.status(MonitorAction::Started, Some(mode)))
    }

    pub fn stop(&self, mode: MonitorMode) -> Result<MonitorStatus, MonitorError> {
        if !self.monitor.is_running(mode) {
            return Err(MonitorError::NotRunning(mode));
        }
        self.monitor.stop(mode)?;
        info!("Stopped {} monitor", mode);
        Ok(self.status(MonitorAction::Stopped, Some(mode)))
    }

    pub fn reset(&self) -> Result<MonitorStatus, MonitorError> {
        self.monitor.reset()?;
        info!("Monitor samples reset");
        Ok(self.status(MonitorAction::Reset, None))
    }

    fn status(&self, action: MonitorAction, mode: Option<MonitorMode>) -> MonitorStatus {
        MonitorStatus {
            action,
            mode,
            running: MonitorMode::ALL
                .into_iter()
                .filter(|m| self.monitor.is_running(*m))
                .collect(),
        }
    }
}
