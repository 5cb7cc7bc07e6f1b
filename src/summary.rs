//! Summary assembly
//!
//! Joins the metrics calculator and event detector over the same series and
//! derives the recommendation flags from the configured rule thresholds.

use crate::config::{AnalysisConfig, EpisodeStrategy, RuleThresholds};
use crate::error::AnalysisError;
use crate::metrics::MetricsCalculator;
use crate::patterns::EventDetector;
use crate::types::{GlucosePoint, MetricsResult, PatternReport, Summary, SummaryContext};
use log::info;

/// Assembler for metrics, patterns and recommendation flags
pub struct SummaryAssembler;

impl SummaryAssembler {
    /// Summarize a sorted series.
    ///
    /// Fails with [`AnalysisError::InvalidConfig`] on inconsistent thresholds and
    /// propagates [`AnalysisError::EmptySeries`] from the metrics calculator.
    pub fn summarize(
        series: &[GlucosePoint],
        config: &AnalysisConfig,
    ) -> Result<Summary, AnalysisError> {
        config.validate()?;
        let metrics = MetricsCalculator::compute(series, &config.ranges)?;
        let patterns = EventDetector::detect(series, config);
        let recommendation_context =
            derive_context(&metrics, &patterns, &config.rules, config.episodes.strategy);

        let raised: Vec<&str> = recommendation_context
            .flags()
            .iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| *name)
            .collect();
        info!(
            "summarized {} points: tir={}%, cv={}%, flags={:?}",
            metrics.total_points, metrics.tir_percent, metrics.cv, raised
        );

        Ok(Summary {
            metrics,
            patterns,
            recommendation_context,
        })
    }

    /// Summarize with default thresholds
    pub fn summarize_default(series: &[GlucosePoint]) -> Result<Summary, AnalysisError> {
        Self::summarize(series, &AnalysisConfig::default())
    }
}

/// Apply the rule thresholds to metrics and detected events
pub fn derive_context(
    metrics: &MetricsResult,
    patterns: &PatternReport,
    rules: &RuleThresholds,
    strategy: EpisodeStrategy,
) -> SummaryContext {
    SummaryContext {
        high_cv: metrics.cv > rules.high_cv_percent,
        low_tir: metrics.tir_percent < rules.low_tir_percent,
        frequent_hypos: patterns.nocturnal_hypo_events(strategy).len()
            >= rules.frequent_hypo_count,
        frequent_spikes: patterns.postprandial_spikes.len() >= rules.frequent_spike_count,
        dawn_present: patterns.dawn_phenomenon,
    }
}
