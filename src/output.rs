//! Output formatting and persistence for run summaries.
//!
//! Supports a structured log stream, JSON files, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::Summary;

/// Flat, CSV-friendly view of a [`Summary`], one row per run.
#[derive(Debug, Serialize)]
pub struct SummaryRow {
    pub timestamp: DateTime<Utc>,
    pub total_records: u64,
    pub dirty_records: u64,
    pub batch_errors: u64,
    pub skipped_units: u64,
    pub run_duration: f64,
    pub busiest_city: Option<String>,
    pub max_arrived_city: Option<String>,
    pub max_departed_city: Option<String>,
    pub cancelled: bool,
}

impl From<&Summary> for SummaryRow {
    fn from(summary: &Summary) -> Self {
        SummaryRow {
            timestamp: Utc::now(),
            total_records: summary.total_records,
            dirty_records: summary.dirty_records,
            batch_errors: summary.batch_errors,
            skipped_units: summary.skipped_units,
            run_duration: summary.run_duration,
            busiest_city: summary.top_cities.first().map(|e| e.city.clone()),
            max_arrived_city: summary.max_arrived_city.clone(),
            max_departed_city: summary.max_departed_city.clone(),
            cancelled: summary.cancelled,
        }
    }
}

/// Logs every field of the summary, one event per top city.
pub fn log_summary(summary: &Summary) {
    info!(total_records = summary.total_records, "Total records processed");
    info!(dirty_records = summary.dirty_records, "Dirty records");
    info!(
        run_duration = %format!("{:.2}", summary.run_duration),
        "Total run duration (seconds)"
    );

    for entry in &summary.top_cities {
        info!(
            city = %entry.city,
            flights = entry.flights,
            average_duration = %format!("{:.2}", entry.average_duration),
            p95_duration = ?entry.p95_duration,
            "Top city"
        );
    }

    info!(city = ?summary.max_arrived_city, "City with max passengers arrived");
    info!(city = ?summary.max_departed_city, "City with max passengers departed");
}

/// Logs the summary as pretty-printed JSON.
pub fn print_json(summary: &Summary) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Writes the summary as pretty-printed JSON to `path`, replacing any existing file.
pub fn write_json(path: &str, summary: &Summary) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()?;
    debug!(path, "Summary JSON written");
    Ok(())
}

/// Appends a [`SummaryRow`] to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, row: &SummaryRow) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(row)?;
    writer.flush()?;

    Ok(())
}
