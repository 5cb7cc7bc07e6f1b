//! Flat record list adapter
//!
//! Parses a bare JSON array of readings where each record may name its fields
//! differently depending on the exporting tool.

use crate::error::AnalysisError;
use crate::types::GlucosePoint;
use log::debug;
use serde_json::{Map, Value};

use super::{is_present, read_glucose, read_timestamp, RecordAdapter};

/// Accepted timestamp field names, in priority order
pub const TIME_FIELDS: [&str; 3] = ["timestamp", "systemTime", "displayTime"];

/// Accepted glucose field names, in priority order
pub const GLUCOSE_FIELDS: [&str; 3] = ["glucose_mg_per_dl", "value", "smoothedValue"];

/// Flat array adapter
pub struct FlatAdapter;

impl RecordAdapter for FlatAdapter {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn matches(&self, raw: &Value) -> bool {
        raw.is_array()
    }

    fn parse(&self, raw: &Value) -> Result<Vec<GlucosePoint>, AnalysisError> {
        let items = raw.as_array().ok_or_else(|| {
            AnalysisError::UnrecognizedFormat("expected an array of readings".to_string())
        })?;

        let mut points = Vec::with_capacity(items.len());
        let mut dropped = 0usize;

        for item in items {
            let Some(record) = item.as_object() else {
                dropped += 1;
                continue;
            };

            let value = first_present(record, &GLUCOSE_FIELDS);
            let time = first_present(record, &TIME_FIELDS);

            let (Some(value), Some(time)) = (value, time) else {
                dropped += 1;
                continue;
            };

            // A present but unusable glucose value drops the record rather than
            // falling through to a lower-priority alias.
            let Some(glucose) = read_glucose(value) else {
                dropped += 1;
                continue;
            };

            let timestamp = read_timestamp(time)?;
            match GlucosePoint::try_new(timestamp, glucose) {
                Some(point) => points.push(point),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!("flat: dropped {dropped} of {} records without usable data", items.len());
        }

        Ok(points)
    }
}

/// First alias that is present on the record
fn first_present<'a>(record: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| record.get(*field))
        .find(|value| is_present(value))
}
