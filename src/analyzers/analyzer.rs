use crate::analyzers::aggregate::CityAggregator;
use crate::analyzers::ledger::FlowLedger;
use crate::analyzers::types::Summary;
use crate::error::BatchDecodeError;
use crate::parser::parse_batch;
use crate::record::{Validated, validate};
use crate::source::RecordSource;
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Accumulated state of one aggregation run.
///
/// Partial aggregations built from disjoint batches can be merged in any
/// order and give the same totals.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub total_records: u64,
    pub dirty_records: u64,
    pub batch_errors: u64,
    pub skipped_units: u64,
    pub cities: CityAggregator,
    pub ledger: FlowLedger,
}

/// Record counts for a single decoded batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub records: u64,
    pub dirty: u64,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one batch and feeds its valid records to the aggregator and ledger.
    ///
    /// A batch that fails to decode is counted in `batch_errors` and leaves
    /// every other counter untouched.
    pub fn ingest_batch(
        &mut self,
        batch: &str,
        bytes: &[u8],
    ) -> Result<BatchReport, BatchDecodeError> {
        let records = match parse_batch(batch, bytes) {
            Ok(records) => records,
            Err(e) => {
                self.batch_errors += 1;
                return Err(e);
            }
        };

        let mut report = BatchReport::default();
        for raw in records {
            report.records += 1;
            match validate(raw) {
                Validated::Valid(record) => {
                    self.cities.observe(&record);
                    self.ledger.observe(&record);
                }
                Validated::Dirty(reason) => {
                    report.dirty += 1;
                    debug!(batch, %reason, "Dirty record dropped");
                }
            }
        }

        self.total_records += report.records;
        self.dirty_records += report.dirty;
        Ok(report)
    }

    pub fn merge(&mut self, other: Aggregation) {
        self.total_records += other.total_records;
        self.dirty_records += other.dirty_records;
        self.batch_errors += other.batch_errors;
        self.skipped_units += other.skipped_units;
        self.cities.merge(other.cities);
        self.ledger.merge(other.ledger);
    }
}

/// Cooperative stop signal, checked between batches.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Settings for [`run`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Units read and decoded at the same time. 1 processes them strictly in order.
    pub concurrency: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Aggregates every unit of `source` into a [`Summary`].
///
/// Unreadable units and undecodable batches are counted and skipped. Once
/// `cancel` is set no further units are started and the summary covers what
/// was done.
///
/// # Errors
///
/// Fails only if the source cannot list its units.
#[tracing::instrument(skip(source, cancel), fields(concurrency = options.concurrency))]
pub async fn run(
    source: Arc<dyn RecordSource>,
    options: &RunOptions,
    cancel: CancelToken,
) -> Result<Summary> {
    let started = Instant::now();
    let total = aggregate(source, options, &cancel).await?;

    let cancelled = cancel.is_cancelled();
    if cancelled {
        warn!("Run cancelled, summary covers processed units only");
    }

    let summary = Summary::build(&total, started, cancelled);
    info!(
        total_records = summary.total_records,
        dirty_records = summary.dirty_records,
        batch_errors = summary.batch_errors,
        skipped_units = summary.skipped_units,
        "Aggregation run finished"
    );
    Ok(summary)
}

/// Folds every unit of `source` into one [`Aggregation`].
///
/// Each unit is decoded into its own partial aggregation and merged into the
/// total, so the result does not depend on `concurrency`. Units not yet
/// started when `cancel` is set are left out.
pub async fn aggregate(
    source: Arc<dyn RecordSource>,
    options: &RunOptions,
    cancel: &CancelToken,
) -> Result<Aggregation> {
    let units = source.list_units().await?;
    info!(units = units.len(), "Starting aggregation run");

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = Vec::with_capacity(units.len());

    for unit in units {
        let source = source.clone();
        let semaphore = semaphore.clone();
        let cancel = cancel.clone();

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok()?;
            if cancel.is_cancelled() {
                return None;
            }
            Some(process_unit(&*source, unit).await)
        }));
    }

    let mut total = Aggregation::new();
    for task in tasks {
        match task.await {
            Ok(Some(partial)) => total.merge(partial),
            Ok(None) => {}
            Err(e) => error!(error = %e, "Unit task failed"),
        }
    }
    Ok(total)
}

async fn process_unit(source: &dyn RecordSource, unit: String) -> Aggregation {
    let mut partial = Aggregation::new();

    let bytes = match source.read_unit(&unit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(unit = %e.unit(), error = %e, "Skipping unit");
            partial.skipped_units += 1;
            return partial;
        }
    };

    let decoded = tokio::task::spawn_blocking(move || {
        let result = partial.ingest_batch(&unit, &bytes);
        (partial, result)
    })
    .await;

    match decoded {
        Ok((partial, Ok(report))) => {
            debug!(records = report.records, dirty = report.dirty, "Batch aggregated");
            partial
        }
        Ok((partial, Err(e))) => {
            error!(batch = %e.batch, error = %e.source, "Batch decode failed, skipping");
            partial
        }
        Err(e) => {
            error!(error = %e, "Batch worker failed");
            Aggregation::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use std::collections::BTreeMap;

    /// In-memory source; units map to their bytes, `None` marks an unreadable unit.
    struct MemorySource(BTreeMap<String, Option<Vec<u8>>>);

    impl MemorySource {
        fn new(units: &[(&str, Option<&str>)]) -> Arc<dyn RecordSource> {
            Arc::new(Self(
                units
                    .iter()
                    .map(|(name, body)| (name.to_string(), body.map(|b| b.as_bytes().to_vec())))
                    .collect(),
            ))
        }
    }

    #[async_trait::async_trait]
    impl RecordSource for MemorySource {
        async fn list_units(&self) -> Result<Vec<String>> {
            Ok(self.0.keys().cloned().collect())
        }

        async fn read_unit(&self, unit: &str) -> Result<Vec<u8>, SourceError> {
            match self.0.get(unit) {
                Some(Some(bytes)) => Ok(bytes.clone()),
                _ => Err(SourceError::Unavailable {
                    unit: unit.to_string(),
                    reason: "gone".to_string(),
                }),
            }
        }
    }

    /// Wraps a source and sets `cancel` as soon as the first unit is read.
    struct CancelAfterFirstRead {
        inner: Arc<dyn RecordSource>,
        cancel: CancelToken,
    }

    #[async_trait::async_trait]
    impl RecordSource for CancelAfterFirstRead {
        async fn list_units(&self) -> Result<Vec<String>> {
            self.inner.list_units().await
        }

        async fn read_unit(&self, unit: &str) -> Result<Vec<u8>, SourceError> {
            let bytes = self.inner.read_unit(unit).await;
            self.cancel.cancel();
            bytes
        }
    }

    fn flight(origin: &str, destination: &str, duration: u64, passengers: u64) -> String {
        format!(
            r#"{{"date": "2024-06-01T12:00:00", "origin_city": "{origin}", "destination_city": "{destination}",
                "flight_duration_secs": {duration}, "passengers_on_board": {passengers}}}"#
        )
    }

    fn batch(flights: &[String]) -> String {
        format!("[{}]", flights.join(","))
    }

    fn corpus() -> Vec<(String, Option<String>)> {
        let mut units = Vec::new();
        for i in 0..12u64 {
            let flights: Vec<String> = (0..=i)
                .map(|j| {
                    flight(
                        &format!("City_{i}"),
                        &format!("City_{}", (i + j) % 7),
                        1800 + 60 * j,
                        1 + i * j,
                    )
                })
                .collect();
            units.push((format!("{i:02}.json"), Some(batch(&flights))));
        }
        units.push(("broken.json".to_string(), Some("[{".to_string())));
        units.push(("dirty.json".to_string(), Some(batch(&[flight("A", "B", 600, 0)]))));
        units.push(("missing.json".to_string(), None));
        units
    }

    fn source(units: &[(String, Option<String>)]) -> Arc<dyn RecordSource> {
        let borrowed: Vec<(&str, Option<&str>)> = units
            .iter()
            .map(|(n, b)| (n.as_str(), b.as_deref()))
            .collect();
        MemorySource::new(&borrowed)
    }

    #[test]
    fn test_ingest_counts_dirty_records() {
        let mut aggregation = Aggregation::new();
        let bytes = batch(&[
            flight("X", "Y", 100, 10),
            flight("X", "Y", 100, 0),
            r#"{"origin_city": "X"}"#.to_string(),
        ]);

        let report = aggregation.ingest_batch("mixed.json", bytes.as_bytes()).unwrap();

        assert_eq!(report, BatchReport { records: 3, dirty: 2 });
        assert_eq!(aggregation.total_records, 3);
        assert_eq!(aggregation.dirty_records, 2);
        assert_eq!(aggregation.cities.total_count(), 1);
        assert_eq!(aggregation.ledger.balance("Y"), Some(10));
    }

    #[test]
    fn test_dirty_records_never_reach_ledger() {
        let mut aggregation = Aggregation::new();
        let bytes = batch(&[flight("X", "Y", 100, 0)]);
        aggregation.ingest_batch("zero.json", bytes.as_bytes()).unwrap();

        assert_eq!(aggregation.dirty_records, 1);
        assert!(aggregation.cities.is_empty());
        assert!(aggregation.ledger.is_empty());
    }

    #[test]
    fn test_malformed_batch_is_skipped_whole() {
        let mut aggregation = Aggregation::new();
        let bytes = format!("[{}, 5]", flight("X", "Y", 100, 10));

        assert!(aggregation.ingest_batch("bad.json", bytes.as_bytes()).is_err());
        assert_eq!(aggregation.batch_errors, 1);
        assert_eq!(aggregation.total_records, 0);
        assert!(aggregation.cities.is_empty());
    }

    #[tokio::test]
    async fn test_run_counts_every_outcome() {
        let summary = run(source(&corpus()), &RunOptions::default(), CancelToken::new())
            .await
            .unwrap();

        // 1 + 2 + ... + 12 valid records plus one dirty record.
        assert_eq!(summary.total_records, 79);
        assert_eq!(summary.dirty_records, 1);
        assert_eq!(summary.valid_records(), 78);
        assert_eq!(summary.batch_errors, 1);
        assert_eq!(summary.skipped_units, 1);
        assert_eq!(summary.top_cities.len(), 7);
        assert!(!summary.cancelled);
    }

    #[tokio::test]
    async fn test_concurrent_run_matches_sequential() {
        let units = corpus();
        let sequential = run(source(&units), &RunOptions::default(), CancelToken::new())
            .await
            .unwrap();
        let concurrent = run(
            source(&units),
            &RunOptions { concurrency: 4 },
            CancelToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(sequential.total_records, concurrent.total_records);
        assert_eq!(sequential.dirty_records, concurrent.dirty_records);
        assert_eq!(sequential.top_cities, concurrent.top_cities);
        assert_eq!(sequential.max_arrived_city, concurrent.max_arrived_city);
        assert_eq!(sequential.max_departed_city, concurrent.max_departed_city);
    }

    #[tokio::test]
    async fn test_all_malformed_corpus() {
        let units = vec![
            ("a.json".to_string(), Some("not json".to_string())),
            ("b.json".to_string(), Some("{}".to_string())),
        ];
        let summary = run(source(&units), &RunOptions::default(), CancelToken::new())
            .await
            .unwrap();

        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.batch_errors, 2);
        assert!(summary.top_cities.is_empty());
        assert_eq!(summary.max_arrived_city, None);
        assert_eq!(summary.max_departed_city, None);
    }

    #[tokio::test]
    async fn test_cancelled_run_returns_partial_summary() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let summary = run(source(&corpus()), &RunOptions::default(), cancel)
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.total_records, 0);
        assert!(summary.top_cities.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_run_keeps_totals_consistent() {
        let cancel = CancelToken::new();
        let interrupted: Arc<dyn RecordSource> = Arc::new(CancelAfterFirstRead {
            inner: source(&corpus()),
            cancel: cancel.clone(),
        });
        let summary = run(interrupted, &RunOptions::default(), cancel)
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert!(summary.total_records > 0);
        assert!(summary.total_records < 79);
        let listed: u64 = summary.top_cities.iter().map(|e| e.flights).sum();
        assert_eq!(summary.total_records, summary.dirty_records + listed);

        let cancel = CancelToken::new();
        let interrupted: Arc<dyn RecordSource> = Arc::new(CancelAfterFirstRead {
            inner: source(&corpus()),
            cancel: cancel.clone(),
        });
        let partial = aggregate(interrupted, &RunOptions::default(), &cancel)
            .await
            .unwrap();

        assert!(cancel.is_cancelled());
        assert!(partial.total_records < 79);
        assert_eq!(
            partial.total_records,
            partial.dirty_records + partial.cities.total_count()
        );
        assert_eq!(partial.ledger.total(), 0);
    }
}
