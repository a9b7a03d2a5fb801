//! JSON decoder for flight-record batches.

use crate::error::BatchDecodeError;
use crate::record::RawRecord;
use serde_json::{Map, Value};

/// Decodes a batch of raw records from the bytes of one source unit.
///
/// Missing fields are allowed here and are dealt with by the validator. When
/// an object repeats a key, the last value wins.
///
/// # Errors
///
/// Returns a [`BatchDecodeError`] tagged with `batch` if the bytes are not a
/// JSON array of objects. No records are salvaged from a rejected batch.
pub fn parse_batch(batch: &str, bytes: &[u8]) -> Result<Vec<RawRecord>, BatchDecodeError> {
    let objects: Vec<Map<String, Value>> =
        serde_json::from_slice(bytes).map_err(|source| BatchDecodeError {
            batch: batch.to_string(),
            source,
        })?;
    Ok(objects.into_iter().map(RawRecord::from).collect())
}
