//! Flight record schema and the dirty-record rule.
//!
//! A batch decodes into [`RawRecord`]s whose recognized fields may be absent,
//! null or of the wrong type. [`validate`] turns each one into either a typed
//! [`FlightRecord`] or the reason it was dropped.
//!
//! A record is dirty when any recognized field is absent, null or numeric
//! zero. That includes `passengers_on_board == 0`: an empty flight is dropped
//! like a broken one. Whether that is right for empty flights is still an open
//! product question, so the rule is pinned by tests rather than relaxed here.

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// A candidate record as decoded from a batch, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_city: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_city: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_duration_secs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passengers_on_board: Option<Value>,
}

impl From<Map<String, Value>> for RawRecord {
    /// Picks the recognized fields out of a decoded object; others are ignored.
    fn from(mut object: Map<String, Value>) -> Self {
        RawRecord {
            date: object.remove("date"),
            origin_city: object.remove("origin_city"),
            destination_city: object.remove("destination_city"),
            flight_duration_secs: object.remove("flight_duration_secs"),
            passengers_on_board: object.remove("passengers_on_board"),
        }
    }
}

/// A validated flight. Every field is present and non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightRecord {
    pub date: String,
    pub origin_city: String,
    pub destination_city: String,
    pub duration_secs: u64,
    pub passengers: u64,
}

/// Why a record was classified as dirty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirtyReason {
    #[error("field `{0}` is missing or null")]
    Missing(&'static str),
    #[error("field `{0}` is zero")]
    Zero(&'static str),
    #[error("field `{0}` has an unexpected value")]
    Malformed(&'static str),
    #[error("destination city is empty")]
    EmptyDestination,
}

/// Outcome of validating one candidate record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validated {
    Valid(FlightRecord),
    Dirty(DirtyReason),
}

impl Validated {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validated::Valid(_))
    }
}

/// Applies the dirty-record rule to a decoded record.
pub fn validate(raw: RawRecord) -> Validated {
    match typed(raw) {
        Ok(record) => Validated::Valid(record),
        Err(reason) => Validated::Dirty(reason),
    }
}

fn typed(raw: RawRecord) -> Result<FlightRecord, DirtyReason> {
    let record = FlightRecord {
        date: text("date", raw.date)?,
        origin_city: text("origin_city", raw.origin_city)?,
        destination_city: text("destination_city", raw.destination_city)?,
        duration_secs: count("flight_duration_secs", raw.flight_duration_secs)?,
        passengers: passengers(raw.passengers_on_board)?,
    };

    if record.destination_city.is_empty() {
        return Err(DirtyReason::EmptyDestination);
    }

    Ok(record)
}

fn text(field: &'static str, value: Option<Value>) -> Result<String, DirtyReason> {
    match value {
        None | Some(Value::Null) => Err(DirtyReason::Missing(field)),
        Some(Value::String(s)) => Ok(s),
        Some(v) if is_zero(&v) => Err(DirtyReason::Zero(field)),
        Some(_) => Err(DirtyReason::Malformed(field)),
    }
}

fn count(field: &'static str, value: Option<Value>) -> Result<u64, DirtyReason> {
    match value {
        None | Some(Value::Null) => Err(DirtyReason::Missing(field)),
        Some(v) if is_zero(&v) => Err(DirtyReason::Zero(field)),
        Some(Value::Number(n)) => whole_number(&n).ok_or(DirtyReason::Malformed(field)),
        Some(_) => Err(DirtyReason::Malformed(field)),
    }
}

// Balances are signed, so a passenger count must fit in an i64.
fn passengers(value: Option<Value>) -> Result<u64, DirtyReason> {
    const FIELD: &str = "passengers_on_board";
    let n = count(FIELD, value)?;
    i64::try_from(n).map_err(|_| DirtyReason::Malformed(FIELD))?;
    Ok(n)
}

// Accepts positive integers, including floats such as `3600.0`.
fn whole_number(n: &Number) -> Option<u64> {
    if let Some(u) = n.as_u64() {
        return Some(u);
    }
    let f = n.as_f64()?;
    (f.is_finite() && f > 0.0 && f.fract() == 0.0 && f < u64::MAX as f64).then_some(f as u64)
}

// `false` compares equal to 0 in the feeds this format came from.
fn is_zero(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Bool(b) => !b,
        _ => false,
    }
}
