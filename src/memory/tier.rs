//! Memory growth tiers.
//!
//! Tiers are evaluated in order, highest first, and do not overlap.

use serde::{Deserialize, Serialize};

use crate::utils::config::{DEFAULT_CAUTION_GROWTH_PERCENT, DEFAULT_SEVERE_GROWTH_PERCENT};
use crate::utils::error::ConfigError;

/// Classification of growth over a baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthTier {
    Normal,
    Caution,
    Severe,
}

impl GrowthTier {
    pub fn as_str(self) -> &'static str {
        match self {
            GrowthTier::Normal => "normal",
            GrowthTier::Caution => "caution",
            GrowthTier::Severe => "severe",
        }
    }
}

/// Percent thresholds separating the tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthTiers {
    /// Growth strictly above this is severe
    #[serde(default = "default_severe")]
    pub severe_percent: f64,

    /// Growth strictly above this (and not severe) is caution
    #[serde(default = "default_caution")]
    pub caution_percent: f64,
}

fn default_severe() -> f64 {
    DEFAULT_SEVERE_GROWTH_PERCENT
}

fn default_caution() -> f64 {
    DEFAULT_CAUTION_GROWTH_PERCENT
}

impl Default for GrowthTiers {
    fn default() -> Self {
        Self {
            severe_percent: DEFAULT_SEVERE_GROWTH_PERCENT,
            caution_percent: DEFAULT_CAUTION_GROWTH_PERCENT,
        }
    }
}

impl GrowthTiers {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.severe_percent.is_finite() || !self.caution_percent.is_finite() {
            return Err(ConfigError::Invalid(
                "growth tier percentages must be finite".to_string(),
            ));
        }
        if self.caution_percent > self.severe_percent {
            return Err(ConfigError::Invalid(format!(
                "caution_percent ({}) must not exceed severe_percent ({})",
                self.caution_percent, self.severe_percent
            )));
        }
        Ok(())
    }

    pub fn classify(&self, growth_percent: f64) -> GrowthTier {
        if growth_percent > self.severe_percent {
            GrowthTier::Severe
        } else if growth_percent > self.caution_percent {
            GrowthTier::Caution
        } else {
            GrowthTier::Normal
        }
    }
}

/// Percentage change, or 0.0 if baseline is zero
pub fn safe_percentage(change: i64, baseline: u64) -> f64 {
    if baseline == 0 {
        0.0
    } else {
        (change as f64 / baseline as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries_are_exclusive() {
        let tiers = GrowthTiers::default();
        assert_eq!(tiers.classify(50.0), GrowthTier::Caution);
        assert_eq!(tiers.classify(50.01), GrowthTier::Severe);
        assert_eq!(tiers.classify(25.0), GrowthTier::Normal);
        assert_eq!(tiers.classify(-40.0), GrowthTier::Normal);
    }

    #[test]
    fn test_safe_percentage() {
        assert_eq!(safe_percentage(50, 100), 50.0);
        assert_eq!(safe_percentage(10, 0), 0.0);
        assert_eq!(safe_percentage(-25, 100), -25.0);
    }

    #[test]
    fn test_inverted_tiers_rejected() {
        let tiers = GrowthTiers {
            severe_percent: 10.0,
            caution_percent: 20.0,
        };
        assert!(tiers.validate().is_err());
    }
}
