use crate::analyzers::utility::{mean, percentile};
use crate::record::FlightRecord;
use std::collections::HashMap;

/// Running statistics for one destination city.
///
/// `durations` keeps every sample so the p95 is exact. Memory therefore grows
/// with the number of valid records. The total is widened so that summing
/// `u64` durations cannot overflow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityStats {
    pub count: u64,
    pub total_duration: u128,
    pub durations: Vec<u64>,
}

impl CityStats {
    pub fn average_duration(&self) -> f64 {
        mean(self.total_duration, self.count)
    }

    /// 95th percentile of the recorded durations, `None` when there are none.
    pub fn p95_duration(&self) -> Option<f64> {
        let mut sorted = self.durations.clone();
        sorted.sort_unstable();
        percentile(&sorted, 0.95)
    }

    fn merge(&mut self, other: CityStats) {
        self.count += other.count;
        self.total_duration += other.total_duration;
        self.durations.extend(other.durations);
    }
}

/// Per-destination-city statistics accumulated over a run.
#[derive(Debug, Clone, Default)]
pub struct CityAggregator {
    cities: HashMap<String, CityStats>,
}

impl CityAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one valid flight against its destination city.
    pub fn observe(&mut self, record: &FlightRecord) {
        let stats = self
            .cities
            .entry(record.destination_city.clone())
            .or_default();

        stats.count += 1;
        stats.total_duration += u128::from(record.duration_secs);
        stats.durations.push(record.duration_secs);
    }

    /// Folds a partial aggregator into this one. Order does not matter.
    pub fn merge(&mut self, other: CityAggregator) {
        for (city, stats) in other.cities {
            self.cities.entry(city).or_default().merge(stats);
        }
    }

    pub fn get(&self, city: &str) -> Option<&CityStats> {
        self.cities.get(city)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CityStats)> {
        self.cities.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Number of valid records observed across all cities.
    pub fn total_count(&self) -> u64 {
        self.cities.values().map(|s| s.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight(destination: &str, duration_secs: u64) -> FlightRecord {
        FlightRecord {
            date: "2024-05-05T05:05:05".to_string(),
            origin_city: "City_0".to_string(),
            destination_city: destination.to_string(),
            duration_secs,
            passengers: 1,
        }
    }

    #[test]
    fn test_observe_accumulates_per_destination() {
        let mut agg = CityAggregator::new();
        agg.observe(&flight("City_1", 100));
        agg.observe(&flight("City_1", 300));
        agg.observe(&flight("City_2", 50));

        assert_eq!(agg.len(), 2);
        let city = agg.get("City_1").unwrap();
        assert_eq!(city.count, 2);
        assert_eq!(city.total_duration, 400);
        assert_eq!(city.durations, vec![100, 300]);
        assert_eq!(city.average_duration(), 200.0);
        assert_eq!(agg.total_count(), 3);
    }

    #[test]
    fn test_single_sample_p95_is_the_sample() {
        let mut agg = CityAggregator::new();
        agg.observe(&flight("City_1", 7200));
        assert_eq!(agg.get("City_1").unwrap().p95_duration(), Some(7200.0));
    }

    #[test]
    fn test_no_samples_has_no_p95() {
        assert_eq!(CityStats::default().p95_duration(), None);
    }

    #[test]
    fn test_p95_ignores_arrival_order() {
        let mut agg = CityAggregator::new();
        for d in (1..=20).rev() {
            agg.observe(&flight("City_1", d));
        }
        let p95 = agg.get("City_1").unwrap().p95_duration().unwrap();
        assert!((p95 - 19.05).abs() < 1e-9);
    }

    #[test]
    fn test_huge_durations_do_not_overflow() {
        let mut agg = CityAggregator::new();
        agg.observe(&flight("City_1", u64::MAX));
        agg.observe(&flight("City_1", 2));

        let city = agg.get("City_1").unwrap();
        assert_eq!(city.total_duration, u128::from(u64::MAX) + 2);
        assert_eq!(city.average_duration(), (u64::MAX as f64 + 2.0) / 2.0);
    }

    #[test]
    fn test_merge_sums_and_concatenates() {
        let mut left = CityAggregator::new();
        left.observe(&flight("City_1", 100));

        let mut right = CityAggregator::new();
        right.observe(&flight("City_1", 200));
        right.observe(&flight("City_3", 900));

        left.merge(right);

        let city = left.get("City_1").unwrap();
        assert_eq!(city.count, 2);
        assert_eq!(city.total_duration, 300);
        assert_eq!(city.durations.len(), 2);
        assert_eq!(left.get("City_3").unwrap().count, 1);
    }
}
