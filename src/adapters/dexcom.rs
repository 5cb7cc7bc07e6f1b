//! Dexcom records adapter
//!
//! Parses Dexcom API-style payloads: `{ "records": [ { "systemTime": .., "value": .. } ] }`.

use crate::error::AnalysisError;
use crate::types::GlucosePoint;
use log::debug;
use serde_json::Value;

use super::{is_present, read_glucose, read_timestamp, RecordAdapter};

/// Dexcom `records` payload adapter
pub struct DexcomAdapter;

impl RecordAdapter for DexcomAdapter {
    fn name(&self) -> &'static str {
        "dexcom"
    }

    fn matches(&self, raw: &Value) -> bool {
        raw.as_object()
            .is_some_and(|obj| obj.contains_key("records"))
    }

    fn parse(&self, raw: &Value) -> Result<Vec<GlucosePoint>, AnalysisError> {
        let records = raw
            .get("records")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AnalysisError::UnrecognizedFormat("`records` must be an array".to_string())
            })?;

        let mut points = Vec::with_capacity(records.len());
        let mut dropped = 0usize;

        for record in records {
            let value = record.get("value").filter(|v| is_present(v));
            let time = record.get("systemTime").filter(|v| is_present(v));

            let (Some(value), Some(time)) = (value, time) else {
                dropped += 1;
                continue;
            };

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
            debug!("dexcom: dropped {dropped} of {} records without usable data", records.len());
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dexcom_records() {
        let raw = json!({
            "recordType": "egv",
            "records": [
                { "systemTime": "2024-01-15T08:05:00Z", "displayTime": "2024-01-15T03:05:00", "value": 112 },
                { "systemTime": "2024-01-15T08:00:00Z", "displayTime": "2024-01-15T03:00:00", "value": 108 }
            ]
        });

        let adapter = DexcomAdapter;
        assert!(adapter.matches(&raw));

        let points = adapter.parse(&raw).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].glucose, 112.0);
        assert_eq!(points[1].glucose, 108.0);
    }

    #[test]
    fn test_records_without_value_or_time_are_dropped() {
        let raw = json!({
            "records": [
                { "systemTime": "2024-01-15T08:00:00Z", "value": null },
                { "systemTime": "2024-01-15T08:05:00Z" },
                { "value": 140 },
                { "systemTime": "", "value": 140 },
                { "systemTime": "2024-01-15T08:10:00Z", "value": 0 },
                { "systemTime": "2024-01-15T08:15:00Z", "value": 131 }
            ]
        });

        let points = DexcomAdapter.parse(&raw).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].glucose, 131.0);
    }

    #[test]
    fn test_malformed_system_time_fails() {
        let raw = json!({ "records": [ { "systemTime": "15/01/2024 08:00", "value": 120 } ] });

        match DexcomAdapter.parse(&raw) {
            Err(AnalysisError::MalformedTimestamp(s)) => assert_eq!(s, "15/01/2024 08:00"),
            other => panic!("expected MalformedTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_records_not_an_array() {
        let raw = json!({ "records": { "value": 120 } });
        assert!(matches!(
            DexcomAdapter.parse(&raw),
            Err(AnalysisError::UnrecognizedFormat(_))
        ));
    }
}
