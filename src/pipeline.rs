//! Pipeline orchestration
//!
//! This module provides the public API for cgm-flux.
//! It runs the full pipeline from a raw CGM payload to a summary and advisories.

use crate::config::AnalysisConfig;
use crate::encoder::ReportEncoder;
use crate::error::AnalysisError;
use crate::normalizer::Normalizer;
use crate::recommend::RecommendationEngine;
use crate::summary::SummaryAssembler;
use crate::types::{GlucosePoint, InterpretationReport, Summary};
use serde_json::Value;

/// Result of one analysis run
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Canonical series, sorted by timestamp
    pub series: Vec<GlucosePoint>,
    pub summary: Summary,
    pub recommendations: Vec<String>,
}

/// Analyze a raw CGM JSON payload.
///
/// Pipeline stages:
/// 1. Normalizer - Detect the payload shape and build a sorted series
/// 2. SummaryAssembler - Metrics, event detection and flags
/// 3. RecommendationEngine - Advisories for the raised flags
///
/// # Example
/// ```ignore
/// let analysis = analyze_json(&raw, &AnalysisConfig::default())?;
/// println!("TIR: {}%", analysis.summary.metrics.tir_percent);
/// ```
pub fn analyze_json(raw_json: &str, config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
    let raw: Value = serde_json::from_str(raw_json)?;
    analyze_value(&raw, config)
}

/// Analyze an already-parsed payload
pub fn analyze_value(raw: &Value, config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
    config.validate()?;
    let series = Normalizer::normalize_with(raw, config)?;
    analyze_series(series, config)
}

/// Analyze a canonical series. The series is sorted before use.
pub fn analyze_series(
    mut series: Vec<GlucosePoint>,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    series.sort_by_key(|p| p.timestamp);
    let summary = SummaryAssembler::summarize(&series, config)?;
    let recommendations = RecommendationEngine::recommend(&summary.recommendation_context);

    Ok(Analysis {
        series,
        summary,
        recommendations,
    })
}

/// Processor for repeated runs with a fixed configuration.
///
/// Reports from one processor share the encoder's instance ID.
pub struct CgmProcessor {
    config: AnalysisConfig,
    encoder: ReportEncoder,
}

impl Default for CgmProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CgmProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Create a processor with a validated configuration
    pub fn with_config(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: ReportEncoder::new(),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a raw JSON payload without encoding
    pub fn analyze(&self, raw_json: &str) -> Result<Analysis, AnalysisError> {
        analyze_json(raw_json, &self.config)
    }

    /// Analyze a parsed payload and encode the report
    pub fn process_value(&self, raw: &Value) -> Result<InterpretationReport, AnalysisError> {
        let analysis = analyze_value(raw, &self.config)?;
        self.encoder
            .encode(&analysis.series, &analysis.summary, &analysis.recommendations)
    }

    /// Analyze a raw JSON payload and return the report as pretty JSON
    pub fn process(&self, raw_json: &str) -> Result<String, AnalysisError> {
        let raw: Value = serde_json::from_str(raw_json)?;
        let report = self.process_value(&raw)?;
        serde_json::to_string_pretty(&report).map_err(AnalysisError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpikeConfig;
    use crate::recommend::MAINTAIN_ADVICE;

    fn sample_dexcom_json() -> &'static str {
        r#"{
            "records": [
                { "systemTime": "2024-01-15T10:10:00Z", "value": 180 },
                { "systemTime": "2024-01-15T10:00:00Z", "value": 120 },
                { "systemTime": "2024-01-15T10:05:00Z", "value": 150 },
                { "systemTime": "2024-01-15T10:15:00Z", "value": 0 },
                { "systemTime": "2024-01-15T10:20:00Z" }
            ]
        }"#
    }

    fn flat_json(count: usize, glucose: f64) -> String {
        let records: Vec<String> = (0..count)
            .map(|i| {
                format!(
                    r#"{{"timestamp": "2024-01-15T10:{:02}:00+00:00", "glucose_mg_per_dl": {glucose}}}"#,
                    i * 5
                )
            })
            .collect();
        format!("[{}]", records.join(","))
    }

    #[test]
    fn test_analyze_dexcom_payload() {
        let analysis = analyze_json(sample_dexcom_json(), &AnalysisConfig::default()).unwrap();

        assert_eq!(analysis.series.len(), 3);
        assert_eq!(analysis.series[0].glucose, 120.0);
        assert_eq!(analysis.summary.metrics.mean_glucose, 150.0);
        assert_eq!(analysis.summary.metrics.total_points, 3);
    }

    #[test]
    fn test_flat_scenario() {
        let analysis = analyze_json(&flat_json(12, 100.0), &AnalysisConfig::default()).unwrap();

        assert_eq!(analysis.summary.metrics.mean_glucose, 100.0);
        assert_eq!(analysis.summary.metrics.cv, 0.0);
        assert!(analysis.summary.patterns.postprandial_spikes.is_empty());
        assert_eq!(analysis.recommendations, vec![MAINTAIN_ADVICE.to_string()]);
    }

    #[test]
    fn test_config_flows_through() {
        let raw = r#"[
            {"timestamp": "2024-01-15T13:00:00Z", "value": 110},
            {"timestamp": "2024-01-15T13:05:00Z", "value": 143}
        ]"#;

        let strict = analyze_json(raw, &AnalysisConfig::default()).unwrap();
        assert!(strict.summary.patterns.postprandial_spikes.is_empty());

        let config = AnalysisConfig::default().with_spikes(SpikeConfig::sensitive());
        let sensitive = analyze_json(raw, &config).unwrap();
        assert_eq!(sensitive.summary.patterns.postprandial_spikes.len(), 1);
    }

    #[test]
    fn test_empty_payload_fails() {
        let result = analyze_json("[]", &AnalysisConfig::default());
        assert!(matches!(result, Err(AnalysisError::EmptySeries)));
    }

    #[test]
    fn test_invalid_config_rejected_before_normalizing() {
        let mut config = AnalysisConfig::default();
        config.ranges.very_low = 70.0;

        let result = analyze_json(&flat_json(6, 100.0), &config);
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
        // config errors win over an empty payload
        assert!(matches!(
            analyze_json("[]", &config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        let result = analyze_json("not valid json", &AnalysisConfig::default());
        assert!(matches!(result, Err(AnalysisError::JsonError(_))));
    }

    #[test]
    fn test_processor_report() {
        let processor = CgmProcessor::new();
        let json = processor.process(&flat_json(6, 120.0)).unwrap();

        let report: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(report["producer"]["name"], "cgm-flux");
        assert_eq!(report["span"]["reading_count"], 6);
        assert_eq!(report["summary"]["metrics"]["tir_percent"], 100.0);
        assert_eq!(report["recommendations"][0], MAINTAIN_ADVICE);
    }

    #[test]
    fn test_processor_shares_instance_id() {
        let processor = CgmProcessor::new();
        let raw: Value = serde_json::from_str(&flat_json(3, 120.0)).unwrap();

        let first = processor.process_value(&raw).unwrap();
        let second = processor.process_value(&raw).unwrap();
        assert_eq!(first.producer.instance_id, second.producer.instance_id);
    }

    #[test]
    fn test_processor_rejects_invalid_config() {
        let mut config = AnalysisConfig::default();
        config.ranges.tir_low = 200.0;
        assert!(matches!(
            CgmProcessor::with_config(config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }
}
