use crate::record::FlightRecord;
use std::collections::HashMap;

/// Signed net passenger flow per city: arrivals minus departures.
///
/// Every observed flight moves the same number of passengers out of one city
/// and into another, so the balances always sum to zero. Balances are `i128`
/// so no realistic number of flights can overflow them.
#[derive(Debug, Clone, Default)]
pub struct FlowLedger {
    balances: HashMap<String, i128>,
}

impl FlowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, record: &FlightRecord) {
        let passengers = i128::from(record.passengers);
        *self
            .balances
            .entry(record.origin_city.clone())
            .or_default() -= passengers;
        *self
            .balances
            .entry(record.destination_city.clone())
            .or_default() += passengers;
    }

    pub fn merge(&mut self, other: FlowLedger) {
        for (city, balance) in other.balances {
            *self.balances.entry(city).or_default() += balance;
        }
    }

    pub fn balance(&self, city: &str) -> Option<i128> {
        self.balances.get(city).copied()
    }

    pub fn total(&self) -> i128 {
        self.balances.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// City with the largest net inflow. Ties go to the smallest city name.
    pub fn max_arrived_city(&self) -> Option<&str> {
        self.balances
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(city, _)| city.as_str())
    }

    /// City with the largest net outflow. Ties go to the smallest city name.
    pub fn max_departed_city(&self) -> Option<&str> {
        self.balances
            .iter()
            .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(city, _)| city.as_str())
    }
}
