//! Interpretation workflow
//!
//! Everything around the analytics core that turns a summary into a signed-off
//! report:
//! - `NarrativeGenerator`: summary + advisories to prose (external model, or
//!   the offline `TemplateNarrator`)
//! - `InterpretationStore`: persistence of editable interpretation records and
//!   billing events (`JsonFileStore`)
//! - `run_interpretation` / `finalize_and_bill`: the end-to-end flows

pub mod narrative;
pub mod record;
pub mod store;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::analyze_json;
use crate::types::Summary;
use log::info;
use serde::{Deserialize, Serialize};

pub use narrative::TemplateNarrator;
pub use record::{BillingEvent, InterpretationRecord, CPT_CGM_INTERPRETATION, MIN_BILLABLE_DAYS};
pub use store::JsonFileStore;

/// Turns a summary and its advisories into interpretation prose
pub trait NarrativeGenerator {
    fn generate(&self, summary: &Summary, recommendations: &[String])
        -> Result<String, AnalysisError>;
}

/// Persistence for interpretation records and billing events
pub trait InterpretationStore {
    /// Write a record, replacing any previous version
    fn save(&self, record: &InterpretationRecord) -> Result<(), AnalysisError>;

    /// Read a record by ID
    fn load(&self, id: &str) -> Result<InterpretationRecord, AnalysisError>;

    /// Persist a billing event and return its ID
    fn record_billing(&self, event: &BillingEvent) -> Result<String, AnalysisError>;

    /// Replace the text of an editable record
    fn update_text(
        &self,
        id: &str,
        text: &str,
        provider_id: &str,
    ) -> Result<InterpretationRecord, AnalysisError> {
        let mut record = self.load(id)?;
        if record.finalized {
            return Err(AnalysisError::RecordFinalized(id.to_string()));
        }
        record.revise(text, provider_id);
        self.save(&record)?;
        Ok(record)
    }

    /// Lock a record. A record can only be finalized once.
    fn finalize(&self, id: &str) -> Result<InterpretationRecord, AnalysisError> {
        let mut record = self.load(id)?;
        if record.finalized {
            return Err(AnalysisError::RecordFinalized(id.to_string()));
        }
        record.lock();
        self.save(&record)?;
        Ok(record)
    }
}

/// Output of a full interpretation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretationOutcome {
    pub interpretation_id: String,
    pub summary: Summary,
    pub recommendations: Vec<String>,
    pub interpretation_text: String,
}

/// Finalized record plus the billing event, when one was due
#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub record: InterpretationRecord,
    pub billing: Option<(String, BillingEvent)>,
}

/// Analyze a payload, narrate it and save an editable interpretation.
///
/// Steps: load → summarize → recommend → narrate → save.
pub fn run_interpretation(
    raw_json: &str,
    patient_id: &str,
    provider_id: &str,
    config: &AnalysisConfig,
    narrator: &dyn NarrativeGenerator,
    store: &dyn InterpretationStore,
) -> Result<InterpretationOutcome, AnalysisError> {
    let analysis = analyze_json(raw_json, config)?;
    let interpretation_text = narrator.generate(&analysis.summary, &analysis.recommendations)?;

    let record = InterpretationRecord::new(
        patient_id,
        provider_id,
        analysis.summary.clone(),
        interpretation_text.clone(),
    );
    store.save(&record)?;
    info!(
        "saved interpretation {} for patient {}",
        record.interpretation_id, patient_id
    );

    Ok(InterpretationOutcome {
        interpretation_id: record.interpretation_id,
        summary: analysis.summary,
        recommendations: analysis.recommendations,
        interpretation_text,
    })
}

/// Finalize an interpretation and record a billing event when the monitored
/// duration reaches [`MIN_BILLABLE_DAYS`].
///
/// The record is locked first and billed after. A record that is finalized but
/// still owes a billing event can be passed through again to retry billing; any
/// other call on a finalized record fails with `RecordFinalized`.
pub fn finalize_and_bill(
    store: &dyn InterpretationStore,
    interpretation_id: &str,
    patient_id: &str,
    provider_id: &str,
    duration_days: u32,
) -> Result<FinalizeOutcome, AnalysisError> {
    let mut record = store.load(interpretation_id)?;
    let event = BillingEvent::cgm_interpretation(patient_id, provider_id, duration_days);
    let billing_pending = event.is_some() && record.billing_id.is_none();

    if record.finalized {
        if !billing_pending {
            return Err(AnalysisError::RecordFinalized(interpretation_id.to_string()));
        }
        info!("retrying billing for finalized interpretation {interpretation_id}");
    } else {
        record = store.finalize(interpretation_id)?;
    }

    let billing = match event {
        Some(event) if billing_pending => {
            let billing_id = store.record_billing(&event)?;
            record.billing_id = Some(billing_id.clone());
            store.save(&record)?;
            Some((billing_id, event))
        }
        _ => {
            info!("interpretation {interpretation_id} finalized without billing ({duration_days} days)");
            None
        }
    };

    Ok(FinalizeOutcome { record, billing })
}
