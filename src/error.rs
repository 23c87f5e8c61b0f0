//! Error types for the preparation pipeline.

use thiserror::Error;

/// Errors raised by dataset conversion, normalization, feature assembly and splitting.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Wrong file extension, unparsable content or an unexpected envelope.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Channel arrays disagree across fingers, samples or columns.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Unknown feature field: {0}")]
    UnknownFeatureField(String),

    /// Motion-type sequences of unequal length were handed to the partitioner.
    #[error("Inconsistent dataset length: motion '{motion}' has {actual} records, expected {expected}")]
    InconsistentDatasetLength {
        motion: String,
        expected: usize,
        actual: usize,
    },

    #[error("Record {name}#{run_number} is already normalized")]
    AlreadyNormalized { name: String, run_number: u32 },

    #[error("Record {name}#{run_number} has not been normalized")]
    NotNormalized { name: String, run_number: u32 },

    /// A per-record failure inside a dataset, tagged with its position.
    #[error("{motion}[{index}]: {source}")]
    InRecord {
        motion: String,
        index: usize,
        source: Box<PipelineError>,
    },

    #[error("Train fraction must be in (0, 1], got {0}")]
    InvalidTrainFraction(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
