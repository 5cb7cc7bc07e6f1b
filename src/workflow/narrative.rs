//! Offline narrative text
//!
//! Real deployments plug an external text generator in through
//! [`NarrativeGenerator`]; the template narrator here needs no network access.

use crate::error::AnalysisError;
use crate::types::Summary;

use super::NarrativeGenerator;

/// Deterministic narrator that fills a fixed template from the summary
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateNarrator;

impl NarrativeGenerator for TemplateNarrator {
    fn generate(
        &self,
        summary: &Summary,
        recommendations: &[String],
    ) -> Result<String, AnalysisError> {
        let m = &summary.metrics;
        let p = &summary.patterns;

        let mut text = format!(
            "Mean glucose {} mg/dL (SD {}, CV {}%), GMI {}%. Time in range {}%, below 70 {}%, above 180 {}%.",
            m.mean_glucose,
            m.std_glucose,
            m.cv,
            m.gmi,
            m.tir_percent,
            m.below_70_percent,
            m.above_180_percent
        );

        let mut findings = Vec::new();
        if !p.hypoglycemia_episodes.is_empty() {
            findings.push(format!("{} hypoglycemia episode(s)", p.hypoglycemia_episodes.len()));
        }
        if !p.nocturnal_hypoglycemia_episodes.is_empty() {
            findings.push(format!(
                "{} nocturnal hypoglycemia episode(s)",
                p.nocturnal_hypoglycemia_episodes.len()
            ));
        }
        if !p.hyperglycemia_episodes.is_empty() {
            findings.push(format!(
                "{} hyperglycemia episode(s)",
                p.hyperglycemia_episodes.len()
            ));
        }
        if !p.postprandial_spikes.is_empty() {
            findings.push(format!("{} postprandial spike(s)", p.postprandial_spikes.len()));
        }
        if p.dawn_phenomenon {
            findings.push("dawn phenomenon".to_string());
        }

        if findings.is_empty() {
            text.push_str(" No abnormal patterns detected.");
        } else {
            text.push_str(&format!(" Findings: {}.", findings.join(", ")));
        }

        for rec in recommendations {
            text.push(' ');
            text.push_str(rec);
        }

        Ok(text)
    }
}
