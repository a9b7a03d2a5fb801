use crate::analyzers::aggregate::{CityAggregator, CityStats};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Number of cities kept in the busiest-cities ranking.
pub const TOP_K: usize = 25;

/// Orders cities by count, then prefers the smaller name.
#[derive(Debug)]
struct Rank<'a> {
    count: u64,
    city: &'a str,
    stats: &'a CityStats,
}

impl Ord for Rank<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.city.cmp(self.city))
    }
}

impl PartialEq for Rank<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Rank<'_> {}

impl PartialOrd for Rank<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Returns up to `k` cities with the highest count, busiest first.
///
/// Equal counts are ordered by city name ascending. A min-heap holding at most
/// `k` entries keeps memory bounded by `k` rather than the number of cities.
pub fn top_k(cities: &CityAggregator, k: usize) -> Vec<(&str, &CityStats)> {
    let mut heap: BinaryHeap<Reverse<Rank>> = BinaryHeap::with_capacity(k + 1);

    for (city, stats) in cities.iter() {
        heap.push(Reverse(Rank {
            count: stats.count,
            city,
            stats,
        }));
        if heap.len() > k {
            heap.pop();
        }
    }

    // Ascending order of Reverse<Rank> is best-first.
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(rank)| (rank.city, rank.stats))
        .collect()
}
