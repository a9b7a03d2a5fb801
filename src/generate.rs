//! Synthetic flight corpus writer.
//!
//! Produces one JSON batch file per origin city draw, shaped like the feeds
//! the aggregator consumes, so the pipeline can be exercised end to end.

use anyhow::{Context, Result, ensure};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::record::RawRecord;

/// Flight durations are drawn from this range, in seconds.
const DURATION_SECS: (u64, u64) = (1800, 10800);
const PASSENGERS: (u64, u64) = (1, 300);
const CITY_COUNT: (usize, usize) = (100, 200);

/// Settings for [`generate`].
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub files: usize,
    /// Number of distinct cities; drawn from 100..=200 when unset.
    pub cities: Option<usize>,
    pub min_records: usize,
    pub max_records: usize,
    /// Share of records (0.0–1.0) that get one field nulled, emptied or zeroed.
    pub dirty_ratio: f64,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            files: 5000,
            cities: None,
            min_records: 50,
            max_records: 100,
            dirty_ratio: 0.0,
            seed: None,
        }
    }
}

/// What [`generate`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub files: usize,
    pub records: usize,
    pub dirty: usize,
}

/// Writes `config.files` batch files into `dir`, creating it if needed.
pub fn generate(dir: &Path, config: &GeneratorConfig) -> Result<GenerateReport> {
    ensure!(
        config.min_records <= config.max_records,
        "min_records ({}) exceeds max_records ({})",
        config.min_records,
        config.max_records
    );
    ensure!(
        (0.0..=1.0).contains(&config.dirty_ratio),
        "dirty_ratio must be between 0 and 1, got {}",
        config.dirty_ratio
    );

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let city_count = config
        .cities
        .unwrap_or_else(|| rng.gen_range(CITY_COUNT.0..=CITY_COUNT.1));
    ensure!(city_count > 0, "at least one city is required");
    let cities: Vec<String> = (0..city_count).map(|i| format!("City_{i}")).collect();

    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;
    // 2024 is a leap year.
    let span_secs = TimeDelta::days(366).num_seconds();

    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let month_year = Utc::now().format("%m-%y").to_string();

    let mut report = GenerateReport::default();
    for index in 0..config.files {
        let origin = cities.choose(&mut rng).context("no cities to choose from")?;
        let count = rng.gen_range(config.min_records..=config.max_records);

        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            let mut record = flight(&mut rng, &cities, origin, start, span_secs)?;
            if config.dirty_ratio > 0.0 && rng.gen_bool(config.dirty_ratio) {
                dirty(&mut rng, &mut record);
                report.dirty += 1;
            }
            records.push(record);
        }

        let path = dir.join(format!("{month_year}-{origin}-{index:05}-flights.json"));
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, &records)?;
        writer.flush()?;

        debug!(path = %path.display(), records = count, "Batch written");
        report.files += 1;
        report.records += count;
    }

    info!(
        dir = %dir.display(),
        files = report.files,
        records = report.records,
        dirty = report.dirty,
        cities = city_count,
        "Synthetic corpus generated"
    );
    Ok(report)
}

fn flight(
    rng: &mut StdRng,
    cities: &[String],
    origin: &str,
    start: NaiveDateTime,
    span_secs: i64,
) -> Result<RawRecord> {
    let destination = cities.choose(rng).context("no cities to choose from")?;
    let date = start + TimeDelta::seconds(rng.gen_range(0..span_secs));

    Ok(RawRecord {
        date: Some(json!(date.format("%Y-%m-%dT%H:%M:%S").to_string())),
        origin_city: Some(json!(origin)),
        destination_city: Some(json!(destination)),
        flight_duration_secs: Some(json!(rng.gen_range(DURATION_SECS.0..=DURATION_SECS.1))),
        passengers_on_board: Some(json!(rng.gen_range(PASSENGERS.0..=PASSENGERS.1))),
    })
}

fn dirty(rng: &mut StdRng, record: &mut RawRecord) {
    match rng.gen_range(0..5) {
        0 => record.date = Some(Value::Null),
        1 => record.origin_city = None,
        2 => record.destination_city = Some(json!("")),
        3 => record.flight_duration_secs = Some(json!(0)),
        _ => record.passengers_on_board = Some(json!(0)),
    }
}
