//! CGM Flux - Glucose time-series analytics for CGM interpretation
//!
//! Flux turns raw continuous glucose monitor exports into clinical summaries
//! through a deterministic pipeline: payload adaptation → normalization →
//! {metrics, event detection} → summary assembly → recommendation rules.
//!
//! ## Modules
//!
//! - **Analytics core**: `normalizer`, `metrics`, `patterns`, `summary`, `recommend`
//! - **Reports**: `encoder` wraps a summary into a versioned report
//! - **Workflow**: narration, editable interpretation records, billing events

pub mod adapters;
pub mod config;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod normalizer;
pub mod patterns;
pub mod pipeline;
pub mod recommend;
pub mod summary;
pub mod types;
pub mod workflow;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use metrics::MetricsCalculator;
pub use normalizer::Normalizer;
pub use patterns::EventDetector;
pub use pipeline::{analyze_json, analyze_value, Analysis, CgmProcessor};
pub use recommend::RecommendationEngine;
pub use summary::SummaryAssembler;
pub use types::{GlucosePoint, MetricsResult, PatternReport, Summary, SummaryContext};

/// Library version embedded in every report
pub const CGM_FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "cgm-flux";
