//! JSON file persistence for interpretations and billing events

use crate::error::AnalysisError;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::record::{BillingEvent, InterpretationRecord};
use super::InterpretationStore;

/// Stores one pretty-printed JSON file per record.
///
/// Interpretations live under `<root>/interpretations/<id>.json` and billing
/// events under `<root>/billing/<patient_id>_<uuid>.json`.
pub struct JsonFileStore {
    interpretation_dir: PathBuf,
    billing_dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `root`, creating its directories
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, AnalysisError> {
        let root = root.as_ref();
        Self::with_dirs(root.join("interpretations"), root.join("billing"))
    }

    /// Open a store with explicit directories, creating them
    pub fn with_dirs(
        interpretation_dir: PathBuf,
        billing_dir: PathBuf,
    ) -> Result<Self, AnalysisError> {
        fs::create_dir_all(&interpretation_dir)?;
        fs::create_dir_all(&billing_dir)?;
        Ok(Self {
            interpretation_dir,
            billing_dir,
        })
    }

    pub fn interpretation_dir(&self) -> &Path {
        &self.interpretation_dir
    }

    pub fn billing_dir(&self) -> &Path {
        &self.billing_dir
    }

    fn record_path(&self, id: &str) -> Result<PathBuf, AnalysisError> {
        if !is_safe_component(id) {
            return Err(AnalysisError::RecordNotFound(id.to_string()));
        }
        Ok(self.interpretation_dir.join(format!("{id}.json")))
    }
}

impl InterpretationStore for JsonFileStore {
    fn save(&self, record: &InterpretationRecord) -> Result<(), AnalysisError> {
        let path = self.record_path(&record.interpretation_id)?;
        fs::write(&path, serde_json::to_string_pretty(record)?)?;
        debug!("saved interpretation {}", record.interpretation_id);
        Ok(())
    }

    fn load(&self, id: &str) -> Result<InterpretationRecord, AnalysisError> {
        let path = self.record_path(id)?;
        if !path.exists() {
            return Err(AnalysisError::RecordNotFound(id.to_string()));
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn record_billing(&self, event: &BillingEvent) -> Result<String, AnalysisError> {
        let patient = if is_safe_component(&event.patient_id) {
            event.patient_id.as_str()
        } else {
            "patient"
        };
        let billing_id = format!("{patient}_{}", Uuid::new_v4().simple());
        let path = self.billing_dir.join(format!("{billing_id}.json"));
        fs::write(&path, serde_json::to_string_pretty(event)?)?;
        info!(
            "billing event {billing_id}: CPT {} for {} days",
            event.cpt_code, event.duration_days
        );
        Ok(billing_id)
    }
}

/// Usable as a single file name component
fn is_safe_component(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
