//! CGM payload adapters
//!
//! This module provides adapters that recognize a raw CGM JSON payload shape and
//! map its records to canonical glucose points.

mod dexcom;
mod flat;

pub use dexcom::DexcomAdapter;
pub use flat::FlatAdapter;

use crate::error::AnalysisError;
use crate::types::GlucosePoint;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde_json::Value;

/// Trait for CGM payload adapters
pub trait RecordAdapter {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether this adapter recognizes the payload shape
    fn matches(&self, raw: &Value) -> bool;

    /// Parse raw JSON records into (unsorted) glucose points.
    ///
    /// Records without a usable timestamp or glucose value are skipped.
    fn parse(&self, raw: &Value) -> Result<Vec<GlucosePoint>, AnalysisError>;
}

/// All built-in adapters, in dispatch order
pub fn builtin_adapters() -> [&'static dyn RecordAdapter; 2] {
    [&DexcomAdapter, &FlatAdapter]
}

/// Parse an ISO-8601 timestamp.
///
/// A trailing `Z` is read as `+00:00`. Timestamps without any offset are
/// taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, AnalysisError> {
    let trimmed = raw.trim();
    let normalized = match trimmed.strip_suffix('Z').or_else(|| trimmed.strip_suffix('z')) {
        Some(stem) => format!("{stem}+00:00"),
        None => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt);
    }

    // ISO-8601 also allows a space separator and offsets without a colon
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt);
        }
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    Err(AnalysisError::MalformedTimestamp(raw.to_string()))
}

/// Read a glucose value from a JSON number or numeric string
pub(crate) fn read_glucose(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Read a timestamp field that is known to be present
pub(crate) fn read_timestamp(value: &Value) -> Result<DateTime<FixedOffset>, AnalysisError> {
    match value {
        Value::String(s) => parse_timestamp(s),
        other => Err(AnalysisError::MalformedTimestamp(other.to_string())),
    }
}

/// A field counts as present when it exists, is not null, and is not an empty string
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}
