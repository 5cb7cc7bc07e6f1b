//! Core types for the CGM Flux pipeline
//!
//! This module defines the value types that flow through each stage of the
//! pipeline: canonical glucose points, metrics, detected patterns, the
//! recommendation context, and the encoded interpretation report.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Round to two decimal places, the precision of every reported metric
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// RFC 3339 timestamps that always carry an explicit numeric offset (`+00:00`, never `Z`)
pub mod offset_rfc3339 {
    use chrono::{DateTime, FixedOffset, SecondsFormat};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw).map_err(serde::de::Error::custom)
    }

    /// Format a timestamp the way every serialized field does
    pub fn format(dt: &DateTime<FixedOffset>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
    }
}

/// A single canonical glucose sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucosePoint {
    /// Reading time, with the offset it was recorded in
    #[serde(with = "offset_rfc3339")]
    pub timestamp: DateTime<FixedOffset>,
    /// Glucose concentration (mg/dL), always > 0
    pub glucose: f64,
}

impl GlucosePoint {
    /// Build a point from trusted values.
    ///
    /// Use [`GlucosePoint::try_new`] for anything parsed from outside input.
    pub fn new(timestamp: DateTime<FixedOffset>, glucose: f64) -> Self {
        Self { timestamp, glucose }
    }

    /// Build a point, rejecting non-positive or non-finite glucose values
    pub fn try_new(timestamp: DateTime<FixedOffset>, glucose: f64) -> Option<Self> {
        if glucose.is_finite() && glucose > 0.0 {
            Some(Self { timestamp, glucose })
        } else {
            None
        }
    }
}

/// Aggregate glycemic metrics over a canonical series.
///
/// Bucket names follow the default clinical thresholds; when a custom
/// [`crate::config::RangeThresholds`] is used they refer to the configured bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub mean_glucose: f64,
    pub std_glucose: f64,
    /// Coefficient of variation (%)
    pub cv: f64,
    /// Glucose management indicator (%)
    pub gmi: f64,

    pub tir_percent: f64,
    pub below_70_percent: f64,
    pub below_54_percent: f64,
    pub above_180_percent: f64,
    pub above_250_percent: f64,

    pub tir_count: usize,
    pub below_70_count: usize,
    pub below_54_count: usize,
    pub above_180_count: usize,
    pub above_250_count: usize,
    pub total_points: usize,
}

/// Direction of an out-of-range episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeKind {
    Hypo,
    Hyper,
}

/// A maintained run (or gap-tolerant group) of out-of-range readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub kind: EpisodeKind,
    #[serde(with = "offset_rfc3339")]
    pub start: DateTime<FixedOffset>,
    #[serde(with = "offset_rfc3339")]
    pub end: DateTime<FixedOffset>,
    /// Minimum glucose for hypo episodes, maximum for hyper episodes
    pub extreme_glucose: f64,
    /// Number of readings in the episode
    pub count: usize,
}

impl Episode {
    /// Wall-clock span between first and last reading
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// A postprandial rise detected within a bounded look-ahead horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spike {
    #[serde(with = "offset_rfc3339")]
    pub start: DateTime<FixedOffset>,
    #[serde(with = "offset_rfc3339")]
    pub end: DateTime<FixedOffset>,
    /// Rise in mg/dL, rounded to two decimals
    pub delta: f64,
}

/// Everything the event detector found in a series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub hypoglycemia_episodes: Vec<Episode>,
    pub hyperglycemia_episodes: Vec<Episode>,
    /// Run-length hypo episodes starting in the nocturnal window
    pub nocturnal_hypoglycemia_episodes: Vec<Episode>,
    /// Gap-tolerant groups of nocturnal hypo readings
    pub nocturnal_hypoglycemia_groups: Vec<Episode>,
    pub postprandial_spikes: Vec<Spike>,
    pub dawn_phenomenon: bool,
}

/// Rule-triggered flags consumed by the recommendation engine.
///
/// Missing flags deserialize as `false`; unknown keys are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryContext {
    pub high_cv: bool,
    pub low_tir: bool,
    pub frequent_hypos: bool,
    pub frequent_spikes: bool,
    pub dawn_present: bool,
}

impl SummaryContext {
    /// Flags paired with their external names
    pub fn flags(&self) -> [(&'static str, bool); 5] {
        [
            ("high_cv", self.high_cv),
            ("low_tir", self.low_tir),
            ("frequent_hypos", self.frequent_hypos),
            ("frequent_spikes", self.frequent_spikes),
            ("dawn_present", self.dawn_present),
        ]
    }

    /// True when any flag is raised
    pub fn any(&self) -> bool {
        self.flags().iter().any(|(_, set)| *set)
    }
}

/// Joined output of the metrics calculator and event detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub metrics: MetricsResult,
    pub patterns: PatternReport,
    pub recommendation_context: SummaryContext,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Time span covered by the analyzed readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSpan {
    #[serde(with = "offset_rfc3339")]
    pub first_reading: DateTime<FixedOffset>,
    #[serde(with = "offset_rfc3339")]
    pub last_reading: DateTime<FixedOffset>,
    /// Span length in days, rounded to two decimals
    pub duration_days: f64,
    pub reading_count: usize,
}

/// Complete interpretation payload handed to downstream collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretationReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub span: DataSpan,
    pub summary: Summary,
    pub recommendations: Vec<String>,
}
