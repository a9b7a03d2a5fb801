//! Recoverable errors raised while reading and decoding batches.
//!
//! Neither kind is fatal to a run: the pipeline counts them and moves on to
//! the next unit.

use std::io;

/// A batch whose bytes are not a JSON array of record objects.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode batch {batch}: {source}")]
pub struct BatchDecodeError {
    pub batch: String,
    #[source]
    pub source: serde_json::Error,
}

/// A unit the record source could not supply.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("unit {unit} is unavailable: {reason}")]
    Unavailable { unit: String, reason: String },
    #[error("failed to read unit {unit}: {source}")]
    Read {
        unit: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to fetch unit {unit}: {message}")]
    Fetch { unit: String, message: String },
}

impl SourceError {
    pub fn unit(&self) -> &str {
        match self {
            SourceError::Unavailable { unit, .. }
            | SourceError::Read { unit, .. }
            | SourceError::Fetch { unit, .. } => unit,
        }
    }
}
