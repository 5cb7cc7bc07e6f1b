//! Point normalization
//!
//! This module turns a raw CGM payload of unknown shape into a canonical series:
//! - Shape dispatch to the matching payload adapter
//! - Optional shift of every timestamp to a single reference offset
//! - Ascending sort by timestamp

use crate::adapters::{builtin_adapters, RecordAdapter};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::types::GlucosePoint;
use chrono::FixedOffset;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashSet;

/// Normalizer for converting raw payloads to canonical glucose series
pub struct Normalizer;

impl Normalizer {
    /// Normalize a raw payload with default settings
    pub fn normalize(raw: &Value) -> Result<Vec<GlucosePoint>, AnalysisError> {
        Self::normalize_with(raw, &AnalysisConfig::default())
    }

    /// Normalize a raw payload, honoring `reference_offset_minutes` from the config
    pub fn normalize_with(
        raw: &Value,
        config: &AnalysisConfig,
    ) -> Result<Vec<GlucosePoint>, AnalysisError> {
        let adapter = select_adapter(raw)?;
        let mut series = adapter.parse(raw)?;
        debug!("{}: parsed {} glucose points", adapter.name(), series.len());

        match config.reference_offset_minutes {
            Some(minutes) => {
                let offset = FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
                    AnalysisError::InvalidConfig(format!(
                        "reference_offset_minutes out of range: {minutes}"
                    ))
                })?;
                for point in &mut series {
                    point.timestamp = point.timestamp.with_timezone(&offset);
                }
            }
            None => warn_on_mixed_offsets(&series),
        }

        series.sort_by_key(|p| p.timestamp);
        Ok(series)
    }

    /// Parse a JSON string and normalize it
    pub fn normalize_json(
        raw_json: &str,
        config: &AnalysisConfig,
    ) -> Result<Vec<GlucosePoint>, AnalysisError> {
        let raw: Value = serde_json::from_str(raw_json)?;
        Self::normalize_with(&raw, config)
    }
}

/// Pick the first adapter that recognizes the payload shape
fn select_adapter(raw: &Value) -> Result<&'static dyn RecordAdapter, AnalysisError> {
    builtin_adapters()
        .into_iter()
        .find(|adapter| adapter.matches(raw))
        .ok_or_else(|| {
            let shape = match raw {
                Value::Object(_) => "object without `records`",
                Value::Array(_) => "array",
                Value::String(_) => "string",
                Value::Number(_) => "number",
                Value::Bool(_) => "boolean",
                Value::Null => "null",
            };
            AnalysisError::UnrecognizedFormat(format!("unsupported payload shape: {shape}"))
        })
}

/// Time-of-day windows compare local hours, which only line up across a
/// series recorded in a single offset.
fn warn_on_mixed_offsets(series: &[GlucosePoint]) {
    let offsets: HashSet<i32> = series
        .iter()
        .map(|p| p.timestamp.offset().local_minus_utc())
        .collect();
    if offsets.len() > 1 {
        warn!(
            "series mixes {} UTC offsets; time-of-day windows are not comparable without reference_offset_minutes",
            offsets.len()
        );
    }
}
