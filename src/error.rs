//! Error types shared by the stabilizer and the paint-op settings

use thiserror::Error;

/// Errors surfaced by sampler construction, draining and settings writes
#[derive(Debug, Error)]
pub enum StabilizerError {
    /// Rejected configuration (e.g. a non-positive sample interval)
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An output slot needed the fallback sample but nothing was ever recorded
    #[error("no paint sample available: nothing has been recorded yet")]
    NoSampleAvailable,

    /// Write to a property id the settings object does not expose
    #[error("unknown property '{0}'")]
    UnknownProperty(String),

    /// Write with a value of the wrong kind for the property
    #[error("property '{id}' expects a {expected} value")]
    PropertyTypeMismatch { id: String, expected: &'static str },

    /// Numeric property write outside its declared range
    #[error("value {value} for property '{id}' is outside [{min}, {max}]")]
    PropertyOutOfRange {
        id: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Malformed JSON configuration
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StabilizerError>;
