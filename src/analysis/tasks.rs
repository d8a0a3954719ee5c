//! Report facet computations.
//!
//! Each function here computes one facet of a [`SummaryReport`] from the full
//! record collection. They are pure and only read their input, so the
//! coordinator can run them side by side over a shared slice.
//!
//! [`SummaryReport`]: crate::models::SummaryReport

use crate::models::{ComponentRank, Quantity, Record};
use std::collections::BTreeMap;

/// Number of entries kept per quantity ranking.
pub const RANK_DEPTH: usize = 3;

/// Inclusion rule for the branch averages.
///
/// A record qualifies when its batch label contains `marker` and its branch
/// label contains none of `joint_separators` (dual-program branches such as
/// "CS & EEE" are not comparable with single-degree ones).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortFilter {
    pub marker: String,
    pub joint_separators: Vec<String>,
}

impl Default for CohortFilter {
    fn default() -> Self {
        Self {
            marker: "2024".to_string(),
            joint_separators: vec!["&".to_string(), "+".to_string()],
        }
    }
}

impl From<&crate::config::CohortConfig> for CohortFilter {
    fn from(config: &crate::config::CohortConfig) -> Self {
        Self {
            marker: config.marker.clone(),
            joint_separators: config.joint_separators.clone(),
        }
    }
}

impl CohortFilter {
    /// Whether a record counts towards the branch averages.
    pub fn admits(&self, record: &Record) -> bool {
        let identity = &record.identity;

        identity.batch.contains(self.marker.as_str())
            && !self
                .joint_separators
                .iter()
                .any(|sep| identity.branch.contains(sep.as_str()))
    }
}

/// Mean of every quantity across all records.
pub fn general_averages(records: &[Record]) -> BTreeMap<Quantity, f64> {
    let count = records.len() as f64;
    let mut sums = [0.0_f64; Quantity::ALL.len()];

    for record in records {
        for quantity in Quantity::ALL {
            sums[quantity as usize] += quantity.marks(record);
        }
    }

    Quantity::ALL
        .into_iter()
        .map(|quantity| (quantity, sums[quantity as usize] / count))
        .collect()
}

/// Mean given total per branch, over the records the filter admits.
///
/// Branches without a qualifying record are absent rather than zero.
pub fn branch_averages(records: &[Record], filter: &CohortFilter) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for record in records.iter().filter(|r| filter.admits(r)) {
        let entry = totals.entry(record.identity.branch.as_str()).or_insert((0.0, 0));
        entry.0 += record.total_given();
        entry.1 += 1;
    }

    totals
        .into_iter()
        .map(|(branch, (sum, count))| (branch.to_string(), sum / count as f64))
        .collect()
}

/// Top [`RANK_DEPTH`] records for one quantity, best first.
///
/// Records with equal marks keep their input order.
pub fn component_toppers(records: &[Record], quantity: Quantity) -> Vec<ComponentRank> {
    let projection = quantity.projection();

    let mut ranked: Vec<(&Record, f64)> = records.iter().map(|r| (r, projection(r))).collect();

    // sort_by is stable, which gives earlier records precedence on ties.
    // total_cmp keeps the order total even if a NaN slips through.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(RANK_DEPTH);

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (record, marks))| ComponentRank {
            id: record.id().to_string(),
            name: record.name().to_string(),
            marks,
            rank: i + 1,
        })
        .collect()
}

/// Records whose given total disagrees with the computed one, in input order.
pub fn discrepancies(records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .filter(|r| r.has_discrepancy())
        .cloned()
        .collect()
}
