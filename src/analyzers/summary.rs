use crate::analyzers::analyzer::Aggregation;
use crate::analyzers::topk::{TOP_K, top_k};
use crate::analyzers::types::{Summary, TopKEntry};
use std::time::Instant;

impl Summary {
    /// Builds the summary from the final state of a run.
    ///
    /// `run_duration` is measured from `started` until after the ranking and
    /// the flow extremes have been derived.
    pub fn build(aggregation: &Aggregation, started: Instant, cancelled: bool) -> Self {
        let top_cities = top_k(&aggregation.cities, TOP_K)
            .into_iter()
            .map(|(city, stats)| TopKEntry {
                city: city.to_string(),
                flights: stats.count,
                average_duration: stats.average_duration(),
                p95_duration: stats.p95_duration(),
            })
            .collect();

        let max_arrived_city = aggregation.ledger.max_arrived_city().map(str::to_string);
        let max_departed_city = aggregation.ledger.max_departed_city().map(str::to_string);

        Summary {
            total_records: aggregation.total_records,
            dirty_records: aggregation.dirty_records,
            batch_errors: aggregation.batch_errors,
            skipped_units: aggregation.skipped_units,
            run_duration: started.elapsed().as_secs_f64(),
            top_cities,
            max_arrived_city,
            max_departed_city,
            cancelled,
        }
    }
}
