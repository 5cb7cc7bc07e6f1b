//! Error types for CGM Flux

use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Unrecognized CGM payload format: {0}")]
    UnrecognizedFormat(String),

    #[error("Invalid timestamp format: {0}")]
    MalformedTimestamp(String),

    #[error("No valid CGM glucose data available")]
    EmptySeries,

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Interpretation not found: {0}")]
    RecordNotFound(String),

    #[error("Interpretation {0} has been finalized and cannot be edited")]
    RecordFinalized(String),

    #[error("Narrative generation failed: {0}")]
    Narrative(String),
}
