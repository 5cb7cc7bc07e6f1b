//! Event detection
//!
//! This module scans a canonical series for discrete clinical events:
//! - Hypo/hyperglycemia episodes (run-length)
//! - Nocturnal hypoglycemia, both as a subset of the run-length episodes and
//!   as gap-tolerant groups of low overnight readings
//! - Dawn phenomenon
//! - Postprandial spikes
//!
//! Detection never fails. An empty series yields empty collections and no dawn.

pub mod clock;
pub mod dawn;
pub mod episodes;
pub mod spikes;

use crate::config::{AnalysisConfig, EpisodeStrategy};
use crate::types::{Episode, EpisodeKind, GlucosePoint, PatternReport};
use chrono::Duration;
use log::debug;

pub use dawn::detect_dawn;
pub use episodes::{detect_runs, group_with_gap_tolerance};
pub use spikes::detect_spikes;

/// Detector for clinical events in a glucose series
pub struct EventDetector;

impl EventDetector {
    /// Run every detector over a sorted series
    pub fn detect(series: &[GlucosePoint], config: &AnalysisConfig) -> PatternReport {
        let ep = &config.episodes;

        let hypoglycemia_episodes =
            detect_runs(series, EpisodeKind::Hypo, ep.hypo_below, ep.min_samples);
        let hyperglycemia_episodes =
            detect_runs(series, EpisodeKind::Hyper, ep.hyper_above, ep.min_samples);
        let nocturnal_hypoglycemia_episodes = episodes::nocturnal_subset(&hypoglycemia_episodes);
        let nocturnal_hypoglycemia_groups = group_with_gap_tolerance(
            &episodes::nocturnal_lows(series, ep.hypo_below),
            EpisodeKind::Hypo,
            Duration::minutes(ep.gap_tolerance_minutes),
        );
        let postprandial_spikes = detect_spikes(series, &config.spikes);
        let dawn_phenomenon = detect_dawn(series, &config.dawn);

        debug!(
            "patterns: {} hypo, {} hyper, {} nocturnal ({} groups), {} spikes, dawn={}",
            hypoglycemia_episodes.len(),
            hyperglycemia_episodes.len(),
            nocturnal_hypoglycemia_episodes.len(),
            nocturnal_hypoglycemia_groups.len(),
            postprandial_spikes.len(),
            dawn_phenomenon
        );

        PatternReport {
            hypoglycemia_episodes,
            hyperglycemia_episodes,
            nocturnal_hypoglycemia_episodes,
            nocturnal_hypoglycemia_groups,
            postprandial_spikes,
            dawn_phenomenon,
        }
    }

    /// Run every detector with default thresholds
    pub fn detect_default(series: &[GlucosePoint]) -> PatternReport {
        Self::detect(series, &AnalysisConfig::default())
    }
}

impl PatternReport {
    /// Nocturnal hypoglycemia events under the given grouping strategy
    pub fn nocturnal_hypo_events(&self, strategy: EpisodeStrategy) -> &[Episode] {
        match strategy {
            EpisodeStrategy::RunLength => &self.nocturnal_hypoglycemia_episodes,
            EpisodeStrategy::GapTolerant => &self.nocturnal_hypoglycemia_groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn series_from(start: &str, values: &[f64]) -> Vec<GlucosePoint> {
        let start: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(start).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &g)| GlucosePoint::new(start + Duration::minutes(5 * i as i64), g))
            .collect()
    }

    #[test]
    fn test_flat_series_has_no_events() {
        let series = series_from("2024-01-15T10:00:00+00:00", &[100.0; 12]);
        let report = EventDetector::detect_default(&series);
        assert_eq!(report, PatternReport::default());
    }

    #[test]
    fn test_sustained_hypo() {
        let mut values = vec![60.0; 6];
        values.extend([150.0; 6]);
        let series = series_from("2024-01-15T10:00:00+00:00", &values);

        let report = EventDetector::detect_default(&series);
        assert_eq!(report.hypoglycemia_episodes.len(), 1);
        assert_eq!(report.hypoglycemia_episodes[0].count, 6);
        assert_eq!(report.hypoglycemia_episodes[0].extreme_glucose, 60.0);
        assert!(report.hyperglycemia_episodes.is_empty());
        // daytime lows are not nocturnal
        assert!(report.nocturnal_hypoglycemia_episodes.is_empty());
        assert!(report.nocturnal_hypoglycemia_groups.is_empty());
    }

    #[test]
    fn test_dawn_rise_scenario() {
        let mut series = series_from("2024-01-15T02:00:00+00:00", &[90.0, 80.0, 70.0, 75.0]);
        series.extend(series_from("2024-01-15T06:00:00+00:00", &[85.0, 95.0, 90.0]));

        let report = EventDetector::detect_default(&series);
        assert!(report.dawn_phenomenon);
    }

    #[test]
    fn test_nocturnal_strategies_can_disagree() {
        // two short overnight dips, neither long enough for a run-length episode
        let series = series_from(
            "2024-01-15T01:00:00+00:00",
            &[100.0, 65.0, 62.0, 100.0, 64.0, 100.0],
        );

        let report = EventDetector::detect_default(&series);
        assert!(report.nocturnal_hypo_events(EpisodeStrategy::RunLength).is_empty());

        let groups = report.nocturnal_hypo_events(EpisodeStrategy::GapTolerant);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[0].extreme_glucose, 62.0);
    }

    #[test]
    fn test_nocturnal_episode_subset() {
        let series = series_from(
            "2024-01-15T23:00:00+00:00",
            &[100.0, 60.0, 58.0, 55.0, 61.0, 100.0],
        );

        let report = EventDetector::detect_default(&series);
        assert_eq!(report.hypoglycemia_episodes.len(), 1);
        assert_eq!(report.nocturnal_hypoglycemia_episodes.len(), 1);
        assert_eq!(report.nocturnal_hypoglycemia_groups.len(), 1);
        assert_eq!(report.nocturnal_hypoglycemia_groups[0].count, 4);
    }

    #[test]
    fn test_empty_series() {
        let report = EventDetector::detect_default(&[]);
        assert!(report.hypoglycemia_episodes.is_empty());
        assert!(report.hyperglycemia_episodes.is_empty());
        assert!(report.nocturnal_hypoglycemia_episodes.is_empty());
        assert!(report.nocturnal_hypoglycemia_groups.is_empty());
        assert!(report.postprandial_spikes.is_empty());
        assert!(!report.dawn_phenomenon);
    }
}
