//! Analysis configuration
//!
//! Every clinical threshold used by the calculators and detectors lives here.
//! A config is built once (defaults, JSON, or a file) and passed by reference
//! into each stage, so alternate thresholds can be exercised deterministically.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default lower bound of the target range (mg/dL)
pub const DEFAULT_TIR_LOW: f64 = 70.0;
/// Default upper bound of the target range (mg/dL)
pub const DEFAULT_TIR_HIGH: f64 = 180.0;
/// Level 2 hypoglycemia threshold (mg/dL)
pub const DEFAULT_VERY_LOW: f64 = 54.0;
/// Level 2 hyperglycemia threshold (mg/dL)
pub const DEFAULT_VERY_HIGH: f64 = 250.0;

/// Range boundaries used by the metrics calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeThresholds {
    /// Inclusive lower bound of time-in-range
    pub tir_low: f64,
    /// Inclusive upper bound of time-in-range
    pub tir_high: f64,
    /// Nested below-range bucket (strictly below)
    pub very_low: f64,
    /// Nested above-range bucket (strictly above)
    pub very_high: f64,
}

impl Default for RangeThresholds {
    fn default() -> Self {
        Self {
            tir_low: DEFAULT_TIR_LOW,
            tir_high: DEFAULT_TIR_HIGH,
            very_low: DEFAULT_VERY_LOW,
            very_high: DEFAULT_VERY_HIGH,
        }
    }
}

/// Which nocturnal hypoglycemia collection drives the `frequent_hypos` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStrategy {
    /// Runs of consecutive low samples meeting `min_samples`
    RunLength,
    /// Low readings merged while successive gaps stay within tolerance
    GapTolerant,
}

/// Episode detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Readings strictly below this value are hypoglycemic
    pub hypo_below: f64,
    /// Readings strictly above this value are hyperglycemic
    pub hyper_above: f64,
    /// Minimum consecutive samples for a run-length episode (3 ≈ 15 min at 5-min cadence)
    pub min_samples: usize,
    /// Maximum gap between readings in the same gap-tolerant group
    pub gap_tolerance_minutes: i64,
    pub strategy: EpisodeStrategy,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            hypo_below: DEFAULT_TIR_LOW,
            hyper_above: DEFAULT_TIR_HIGH,
            min_samples: 3,
            gap_tolerance_minutes: 30,
            strategy: EpisodeStrategy::RunLength,
        }
    }
}

/// Dawn phenomenon detection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DawnPolicy {
    /// Peak in [06:00, 08:00) minus nadir in [02:00, 06:00)
    NadirPeak,
    /// Count of rising adjacent pairs inside [02:00, 08:00)
    RiseCount,
}

/// Dawn phenomenon parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DawnConfig {
    pub policy: DawnPolicy,
    /// Minimum rise (mg/dL) for either policy
    pub min_delta: f64,
    /// Rising pairs required by [`DawnPolicy::RiseCount`]
    pub min_rises: usize,
}

impl Default for DawnConfig {
    fn default() -> Self {
        Self {
            policy: DawnPolicy::NadirPeak,
            min_delta: 20.0,
            min_rises: 3,
        }
    }
}

/// Postprandial spike parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeConfig {
    /// Number of subsequent samples inspected from each start sample
    pub lookahead_samples: usize,
    /// Minimum rise (mg/dL) within the horizon
    pub min_delta: f64,
}

impl SpikeConfig {
    /// ~60 minute horizon at 5-minute cadence, 40 mg/dL rise
    pub fn strict() -> Self {
        Self {
            lookahead_samples: 12,
            min_delta: 40.0,
        }
    }

    /// ~30 minute horizon at 5-minute cadence, 30 mg/dL rise
    pub fn sensitive() -> Self {
        Self {
            lookahead_samples: 6,
            min_delta: 30.0,
        }
    }
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self::strict()
    }
}

/// Thresholds applied by the summary assembler to derive recommendation flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// `high_cv` when cv is strictly above this percentage
    pub high_cv_percent: f64,
    /// `low_tir` when time-in-range is strictly below this percentage
    pub low_tir_percent: f64,
    pub frequent_hypo_count: usize,
    pub frequent_spike_count: usize,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            high_cv_percent: 36.0,
            low_tir_percent: 70.0,
            frequent_hypo_count: 2,
            frequent_spike_count: 3,
        }
    }
}

/// Complete, immutable configuration for one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub ranges: RangeThresholds,
    pub episodes: EpisodeConfig,
    pub dawn: DawnConfig,
    pub spikes: SpikeConfig,
    pub rules: RuleThresholds,
    /// When set, every timestamp is shifted to this UTC offset (minutes) before
    /// any time-of-day window is evaluated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_offset_minutes: Option<i32>,
}

impl AnalysisConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builder-style override of the spike parameters
    pub fn with_spikes(mut self, spikes: SpikeConfig) -> Self {
        self.spikes = spikes;
        self
    }

    /// Builder-style override of the dawn policy
    pub fn with_dawn_policy(mut self, policy: DawnPolicy) -> Self {
        self.dawn.policy = policy;
        self
    }

    /// Builder-style override of the episode strategy
    pub fn with_episode_strategy(mut self, strategy: EpisodeStrategy) -> Self {
        self.episodes.strategy = strategy;
        self
    }

    /// Builder-style override of the reference offset
    pub fn with_reference_offset(mut self, minutes: i32) -> Self {
        self.reference_offset_minutes = Some(minutes);
        self
    }

    /// Reject thresholds that cannot describe a coherent analysis
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let r = &self.ranges;
        if !(r.very_low < r.tir_low && r.tir_low <= r.tir_high && r.tir_high < r.very_high) {
            return Err(AnalysisError::InvalidConfig(format!(
                "range thresholds must satisfy very_low < tir_low <= tir_high < very_high (got {} / {} / {} / {})",
                r.very_low, r.tir_low, r.tir_high, r.very_high
            )));
        }
        if self.episodes.min_samples == 0 {
            return Err(AnalysisError::InvalidConfig(
                "episodes.min_samples must be at least 1".to_string(),
            ));
        }
        if self.episodes.gap_tolerance_minutes < 0 {
            return Err(AnalysisError::InvalidConfig(
                "episodes.gap_tolerance_minutes must not be negative".to_string(),
            ));
        }
        if self.spikes.lookahead_samples == 0 {
            return Err(AnalysisError::InvalidConfig(
                "spikes.lookahead_samples must be at least 1".to_string(),
            ));
        }
        if let Some(offset) = self.reference_offset_minutes {
            // chrono::FixedOffset accepts strictly less than one day
            if offset.abs() >= 24 * 60 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "reference_offset_minutes out of range: {offset}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_clinical_thresholds() {
        let config = AnalysisConfig::default();
        assert_eq!(config.ranges.tir_low, 70.0);
        assert_eq!(config.ranges.tir_high, 180.0);
        assert_eq!(config.ranges.very_low, 54.0);
        assert_eq!(config.ranges.very_high, 250.0);
        assert_eq!(config.episodes.min_samples, 3);
        assert_eq!(config.episodes.strategy, EpisodeStrategy::RunLength);
        assert_eq!(config.dawn.policy, DawnPolicy::NadirPeak);
        assert_eq!(config.spikes, SpikeConfig::strict());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = AnalysisConfig::from_json(
            r#"{ "dawn": { "policy": "rise_count" }, "spikes": { "min_delta": 30 } }"#,
        )
        .unwrap();

        assert_eq!(config.dawn.policy, DawnPolicy::RiseCount);
        assert_eq!(config.dawn.min_delta, 20.0);
        assert_eq!(config.spikes.min_delta, 30.0);
        assert_eq!(config.spikes.lookahead_samples, 12);
        assert_eq!(config.ranges, RangeThresholds::default());
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = AnalysisConfig::default()
            .with_spikes(SpikeConfig::sensitive())
            .with_reference_offset(-300);
        let json = config.to_json().unwrap();
        let loaded = AnalysisConfig::from_json(&json).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let result = AnalysisConfig::from_json(r#"{ "ranges": { "tir_low": 200 } }"#);
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_offset_rejected() {
        let config = AnalysisConfig::default().with_reference_offset(24 * 60);
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }
}
