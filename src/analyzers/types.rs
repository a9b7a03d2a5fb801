//! Data types produced by the aggregation pipeline.

use serde::Serialize;

/// One row of the busiest-cities ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopKEntry {
    pub city: String,
    pub flights: u64,
    pub average_duration: f64,
    pub p95_duration: Option<f64>,
}

/// Final result of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_records: u64,
    pub dirty_records: u64,
    /// Batches rejected because they could not be decoded.
    pub batch_errors: u64,
    /// Units the source could not supply.
    pub skipped_units: u64,
    /// Wall-clock seconds from the start of the run until the summary was built.
    pub run_duration: f64,
    pub top_cities: Vec<TopKEntry>,
    pub max_arrived_city: Option<String>,
    pub max_departed_city: Option<String>,
    /// Set when the run stopped early; counts cover only the units processed.
    pub cancelled: bool,
}

impl Summary {
    pub fn valid_records(&self) -> u64 {
        self.total_records - self.dirty_records
    }
}
