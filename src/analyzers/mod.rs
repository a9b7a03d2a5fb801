//! Streaming aggregation of flight records.
//!
//! Valid records feed a per-destination [`aggregate::CityAggregator`] and a
//! network-wide [`ledger::FlowLedger`]. When the corpus is exhausted the
//! busiest cities are ranked by [`topk::top_k`] and everything is folded into
//! a [`types::Summary`].

pub mod aggregate;
pub mod analyzer;
pub mod ledger;
pub mod summary;
pub mod topk;
pub mod types;
pub mod utility;
