//! Report aggregation.
//!
//! `tasks` holds the facet computations, `aggregator` runs them
//! concurrently and merges their output.

pub mod aggregator;
pub mod tasks;

pub use aggregator::aggregate;
pub use tasks::CohortFilter;
