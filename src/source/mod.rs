//! Record sources: where batches come from.
//!
//! A source names its units up front and then hands out the raw bytes of one
//! unit at a time. [`DirectorySource`] reads one file per unit and
//! [`HttpSource`] downloads one URL per unit. Units whose name ends in `.gz`
//! are gunzipped before they reach the decoder.

mod directory;
mod http;

pub use directory::DirectorySource;
pub use http::HttpSource;

use crate::error::SourceError;
use anyhow::Result;
use flate2::read::GzDecoder;
use std::io::Read;

/// Supplies raw batches to the aggregation pipeline.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Names of every unit in the corpus, in processing order.
    async fn list_units(&self) -> Result<Vec<String>>;

    /// Raw, decompressed bytes of one unit.
    async fn read_unit(&self, unit: &str) -> Result<Vec<u8>, SourceError>;
}

/// Gunzips `bytes` when `unit` names a `.gz` file, otherwise returns them as-is.
pub(crate) fn decompress(unit: &str, bytes: Vec<u8>) -> Result<Vec<u8>, SourceError> {
    if !unit.ends_with(".gz") {
        return Ok(bytes);
    }

    let mut out = Vec::with_capacity(bytes.len() * 4);
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut out)
        .map_err(|source| SourceError::Read {
            unit: unit.to_string(),
            source,
        })?;
    Ok(out)
}
