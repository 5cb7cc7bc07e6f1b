//! Report encoding
//!
//! This module wraps a summary and its advisories into a versioned
//! interpretation report with producer metadata and the span of the data.

use crate::error::AnalysisError;
use crate::types::{
    round2, DataSpan, GlucosePoint, InterpretationReport, ReportProducer, Summary,
};
use crate::{CGM_FLUX_VERSION, PRODUCER_NAME};
use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Encoder for interpretation reports
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode a summarized series into a report
    pub fn encode(
        &self,
        series: &[GlucosePoint],
        summary: &Summary,
        recommendations: &[String],
    ) -> Result<InterpretationReport, AnalysisError> {
        let span = data_span(series)?;

        Ok(InterpretationReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: CGM_FLUX_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            span,
            summary: summary.clone(),
            recommendations: recommendations.to_vec(),
        })
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        series: &[GlucosePoint],
        summary: &Summary,
        recommendations: &[String],
    ) -> Result<String, AnalysisError> {
        let report = self.encode(series, summary, recommendations)?;
        serde_json::to_string_pretty(&report).map_err(AnalysisError::JsonError)
    }
}

/// First and last reading of a sorted series and the days between them
pub fn data_span(series: &[GlucosePoint]) -> Result<DataSpan, AnalysisError> {
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(AnalysisError::EmptySeries),
    };

    let seconds = (last.timestamp - first.timestamp).num_seconds() as f64;
    Ok(DataSpan {
        first_reading: first.timestamp,
        last_reading: last.timestamp,
        duration_days: round2(seconds / SECONDS_PER_DAY),
        reading_count: series.len(),
    })
}
