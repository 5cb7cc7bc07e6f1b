//! Recommendation rules
//!
//! Maps raised flags to fixed advisory text in priority order:
//! low_tir, frequent_hypos, high_cv, frequent_spikes, dawn_present.

use crate::types::SummaryContext;
use serde_json::{Map, Value};

pub const LOW_TIR_ADVICE: &str =
    "Consider intensifying glucose control to increase time in range.";
pub const NOCTURNAL_BASAL_ADVICE: &str =
    "Evaluate overnight basal insulin to reduce hypoglycemia events.";
pub const HYPO_AWARENESS_ADVICE: &str =
    "Review patient's hypoglycemia awareness and carbohydrate intake.";
pub const HIGH_CV_ADVICE: &str = "Glycemic variability is elevated; consider smoothing basal-bolus dosing or adjusting meal timing.";
pub const SPIKE_ADVICE: &str =
    "Postprandial spikes suggest possible missed boluses or carbohydrate misestimation.";
pub const DAWN_ADVICE: &str =
    "Dawn phenomenon detected; evaluate basal rate or consider split dose timing.";
pub const MAINTAIN_ADVICE: &str = "Maintain current therapy; no concerning patterns identified.";

/// Rule engine turning flags into advisories
pub struct RecommendationEngine;

impl RecommendationEngine {
    /// Ordered advisories for the raised flags, or a single maintain advisory
    pub fn recommend(context: &SummaryContext) -> Vec<String> {
        let mut advice: Vec<&str> = Vec::new();

        if context.low_tir {
            advice.push(LOW_TIR_ADVICE);
        }
        if context.frequent_hypos {
            advice.push(NOCTURNAL_BASAL_ADVICE);
            advice.push(HYPO_AWARENESS_ADVICE);
        }
        if context.high_cv {
            advice.push(HIGH_CV_ADVICE);
        }
        if context.frequent_spikes {
            advice.push(SPIKE_ADVICE);
        }
        if context.dawn_present {
            advice.push(DAWN_ADVICE);
        }

        if advice.is_empty() {
            advice.push(MAINTAIN_ADVICE);
        }

        advice.into_iter().map(String::from).collect()
    }

    /// Recommend from a loose flag map.
    ///
    /// Unknown keys are ignored; missing or non-boolean flags read as false.
    pub fn recommend_map(flags: &Map<String, Value>) -> Vec<String> {
        let flag = |name: &str| flags.get(name).and_then(Value::as_bool).unwrap_or(false);
        Self::recommend(&SummaryContext {
            high_cv: flag("high_cv"),
            low_tir: flag("low_tir"),
            frequent_hypos: flag("frequent_hypos"),
            frequent_spikes: flag("frequent_spikes"),
            dawn_present: flag("dawn_present"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_no_flags_maintains_therapy() {
        let advice = RecommendationEngine::recommend(&SummaryContext::default());
        assert_eq!(advice, vec![MAINTAIN_ADVICE.to_string()]);
    }

    #[test]
    fn test_priority_order() {
        let ctx = SummaryContext {
            high_cv: true,
            low_tir: true,
            frequent_hypos: true,
            frequent_spikes: true,
            dawn_present: true,
        };

        let advice = RecommendationEngine::recommend(&ctx);
        assert_eq!(
            advice,
            vec![
                LOW_TIR_ADVICE,
                NOCTURNAL_BASAL_ADVICE,
                HYPO_AWARENESS_ADVICE,
                HIGH_CV_ADVICE,
                SPIKE_ADVICE,
                DAWN_ADVICE,
            ]
        );
    }

    #[test]
    fn test_frequent_hypos_emits_two() {
        let ctx = SummaryContext {
            frequent_hypos: true,
            ..SummaryContext::default()
        };
        assert_eq!(RecommendationEngine::recommend(&ctx).len(), 2);
    }

    #[test]
    fn test_single_flag_excludes_maintain() {
        let ctx = SummaryContext {
            dawn_present: true,
            ..SummaryContext::default()
        };
        assert_eq!(RecommendationEngine::recommend(&ctx), vec![DAWN_ADVICE.to_string()]);
    }

    #[test]
    fn test_loose_map_ignores_unknown_and_bad_values() {
        let flags = json!({
            "high_cv": true,
            "low_tir": "yes",
            "made_up_flag": true
        });
        let advice = RecommendationEngine::recommend_map(flags.as_object().unwrap());
        assert_eq!(advice, vec![HIGH_CV_ADVICE.to_string()]);

        let empty = Map::new();
        assert_eq!(
            RecommendationEngine::recommend_map(&empty),
            vec![MAINTAIN_ADVICE.to_string()]
        );
    }

    #[test]
    fn test_context_deserializes_with_missing_flags() {
        let ctx: SummaryContext = serde_json::from_str(r#"{"frequent_spikes": true}"#).unwrap();
        assert_eq!(RecommendationEngine::recommend(&ctx), vec![SPIKE_ADVICE.to_string()]);
    }
}
