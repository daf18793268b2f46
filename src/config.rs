//! `tickscope.toml` configuration loading.
//!
//! Every field is optional; a missing file or a missing table falls back to
//! the defaults in `utils::config`.
//!
//! ```toml
//! [ranking]
//! min_events_five_minutes = 10
//! min_events_one_hour = 50
//!
//! [load]
//! per_tick_limit = 75
//! tick_interval_secs = 0.3
//!
//! [spread]
//! horizon_secs = 1.0
//! bucket_width_secs = 0.05
//! sync_threshold_secs = 0.1
//!
//! [memory]
//! severe_percent = 50.0
//! caution_percent = 25.0
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::memory::GrowthTiers;
use crate::ranking::{AdmissionThrottle, WindowThreshold};
use crate::snapshot::WindowSpan;
use crate::spread::SpreadParams;
use crate::utils::config::{
    DEFAULT_LOAD_K, DEFAULT_MIN_EVENTS_FIVE_MINUTES, DEFAULT_MIN_EVENTS_ONE_HOUR,
    DEFAULT_RANKING_K, MAX_RANKING_K,
};
use crate::utils::error::ConfigError;

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub load: LoadConfig,

    #[serde(default)]
    pub spread: SpreadParams,

    #[serde(default)]
    pub memory: GrowthTiers,
}

/// Defaults for the duration rankings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_min_five")]
    pub min_events_five_minutes: u64,

    #[serde(default = "default_min_hour")]
    pub min_events_one_hour: u64,

    #[serde(default = "default_ranking_k")]
    pub default_k: usize,
}

fn default_min_five() -> u64 {
    DEFAULT_MIN_EVENTS_FIVE_MINUTES
}

fn default_min_hour() -> u64 {
    DEFAULT_MIN_EVENTS_ONE_HOUR
}

fn default_ranking_k() -> usize {
    DEFAULT_RANKING_K
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_events_five_minutes: DEFAULT_MIN_EVENTS_FIVE_MINUTES,
            min_events_one_hour: DEFAULT_MIN_EVENTS_ONE_HOUR,
            default_k: DEFAULT_RANKING_K,
        }
    }
}

impl RankingConfig {
    /// Window thresholds for a two-window ranking
    pub fn windows(&self) -> Vec<WindowThreshold> {
        vec![
            WindowThreshold::new(WindowSpan::FiveMinutes, self.min_events_five_minutes),
            WindowThreshold::new(WindowSpan::OneHour, self.min_events_one_hour),
        ]
    }
}

/// Load ranking defaults plus the admission throttle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(flatten)]
    pub throttle: AdmissionThrottle,

    #[serde(default = "default_load_k")]
    pub default_k: usize,
}

fn default_load_k() -> usize {
    DEFAULT_LOAD_K
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            throttle: AdmissionThrottle::default(),
            default_k: DEFAULT_LOAD_K,
        }
    }
}

impl DiagnosticsConfig {
    /// Reject values no report can work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, k) in [
            ("ranking.default_k", self.ranking.default_k),
            ("load.default_k", self.load.default_k),
        ] {
            if k == 0 || k > MAX_RANKING_K {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_RANKING_K, k
                )));
            }
        }
        self.load.throttle.validate()?;
        self.spread
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.memory.validate()?;
        Ok(())
    }
}

/// Load and validate configuration from a TOML file
///
/// # Errors
/// * `ConfigError::Io` - File cannot be read
/// * `ConfigError::Parse` - TOML is invalid
/// * `ConfigError::Invalid` - Values fail validation
pub fn load_config(path: impl AsRef<Path>) -> Result<DiagnosticsConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading config from: {}", path.display());

    let contents = fs::read_to_string(path)?;
    let config: DiagnosticsConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration if the file exists, otherwise use defaults
pub fn load_config_optional(path: impl AsRef<Path>) -> Result<DiagnosticsConfig, ConfigError> {
    let path = path.as_ref();
    match load_config(path) {
        Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("Config {} not found, using defaults", path.display());
            Ok(DiagnosticsConfig::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[load]\nper_tick_limit = 50\n\n[spread]\nsync_threshold_secs = 0.2").unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.load.throttle.per_tick_limit, 50);
        assert_eq!(config.load.throttle.tick_interval_secs, 0.3);
        assert_eq!(config.load.default_k, 5);
        assert_eq!(config.spread.sync_threshold_secs, 0.2);
        assert_eq!(config.spread.horizon_secs, 1.0);
        assert_eq!(config.ranking, RankingConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[load]\nper_tick_limit = 0").unwrap();

        assert!(matches!(load_config(file.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_optional(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, DiagnosticsConfig::default());
    }
}
