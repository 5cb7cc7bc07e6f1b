//! Interpretation and billing records

use crate::types::{offset_rfc3339, Summary};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// CPT code for professional interpretation of continuous glucose monitoring
pub const CPT_CGM_INTERPRETATION: &str = "95251";

/// Minimum monitored days before the interpretation is billable
pub const MIN_BILLABLE_DAYS: u32 = 3;

/// A provider-facing interpretation, editable until finalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretationRecord {
    pub interpretation_id: String,
    /// Last modification time
    #[serde(with = "offset_rfc3339")]
    pub timestamp: DateTime<FixedOffset>,
    pub patient_id: String,
    pub provider_id: String,
    pub editable: bool,
    pub finalized: bool,
    pub summary: Summary,
    pub interpretation_text: String,
    /// Billing event written for this record, once billed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_id: Option<String>,
}

impl InterpretationRecord {
    /// New editable record with a fresh ID
    pub fn new(
        patient_id: impl Into<String>,
        provider_id: impl Into<String>,
        summary: Summary,
        interpretation_text: impl Into<String>,
    ) -> Self {
        Self {
            interpretation_id: Uuid::new_v4().to_string(),
            timestamp: now(),
            patient_id: patient_id.into(),
            provider_id: provider_id.into(),
            editable: true,
            finalized: false,
            summary,
            interpretation_text: interpretation_text.into(),
            billing_id: None,
        }
    }

    /// Replace the text and take over authorship
    pub(crate) fn revise(&mut self, text: &str, provider_id: &str) {
        self.interpretation_text = text.to_string();
        self.provider_id = provider_id.to_string();
        self.timestamp = now();
    }

    /// Lock the record against further edits
    pub(crate) fn lock(&mut self) {
        self.finalized = true;
        self.editable = false;
        self.timestamp = now();
    }
}

/// A billable interpretation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingEvent {
    #[serde(with = "offset_rfc3339")]
    pub timestamp: DateTime<FixedOffset>,
    pub patient_id: String,
    pub provider_id: String,
    pub cpt_code: String,
    pub duration_days: u32,
}

impl BillingEvent {
    /// CGM interpretation event, or `None` below the minimum monitored duration
    pub fn cgm_interpretation(
        patient_id: &str,
        provider_id: &str,
        duration_days: u32,
    ) -> Option<Self> {
        if duration_days < MIN_BILLABLE_DAYS {
            return None;
        }
        Some(Self {
            timestamp: now(),
            patient_id: patient_id.to_string(),
            provider_id: provider_id.to_string(),
            cpt_code: CPT_CGM_INTERPRETATION.to_string(),
            duration_days,
        })
    }
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::SummaryAssembler;
    use crate::types::GlucosePoint;

    fn summary() -> Summary {
        let t = DateTime::parse_from_rfc3339("2024-01-15T10:00:00+00:00").unwrap();
        SummaryAssembler::summarize_default(&[GlucosePoint::new(t, 120.0)]).unwrap()
    }

    #[test]
    fn test_new_record_is_editable() {
        let record = InterpretationRecord::new("p1", "dr1", summary(), "text");
        assert!(record.editable);
        assert!(!record.finalized);
        assert!(Uuid::parse_str(&record.interpretation_id).is_ok());
    }

    #[test]
    fn test_lock() {
        let mut record = InterpretationRecord::new("p1", "dr1", summary(), "text");
        record.lock();
        assert!(record.finalized);
        assert!(!record.editable);
    }

    #[test]
    fn test_billing_threshold() {
        assert!(BillingEvent::cgm_interpretation("p1", "dr1", 2).is_none());

        let event = BillingEvent::cgm_interpretation("p1", "dr1", 3).unwrap();
        assert_eq!(event.cpt_code, "95251");
        assert_eq!(event.duration_days, 3);
    }

    #[test]
    fn test_record_json_shape() {
        let record = InterpretationRecord::new("p1", "dr1", summary(), "text");
        let value = serde_json::to_value(&record).unwrap();

        for key in [
            "interpretation_id",
            "timestamp",
            "patient_id",
            "provider_id",
            "editable",
            "finalized",
            "summary",
            "interpretation_text",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert!(value["timestamp"].as_str().unwrap().ends_with("+00:00"));
    }
}
