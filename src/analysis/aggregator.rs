//! Concurrent report aggregation.
//!
//! The coordinator fans the facet computations out onto the blocking pool,
//! all reading one shared record slice, and merges their results into a
//! single [`SummaryReport`] behind one mutex.

use crate::analysis::tasks::{self, CohortFilter};
use crate::models::{Quantity, Record, SummaryReport};
use futures::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::debug;

type SharedReport = Arc<Mutex<SummaryReport>>;

/// Compute every facet of the summary report concurrently.
///
/// One task computes the general averages, one the branch averages, one the
/// discrepancies, and one task per [`Quantity`] computes its ranking. The
/// returned future resolves only after all of them have written their facet.
///
/// # Panics
///
/// Panics if `records` is empty. Callers are expected to reject sheets with
/// no usable rows before aggregating. A panic inside any task is re-raised
/// here.
pub async fn aggregate(records: Arc<[Record]>, filter: CohortFilter) -> SummaryReport {
    assert!(
        !records.is_empty(),
        "aggregation requires at least one record"
    );

    let shared: SharedReport = Arc::new(Mutex::new(SummaryReport::default()));
    let mut handles = Vec::with_capacity(Quantity::ALL.len() + 3);

    handles.push(spawn_facet(
        "general averages",
        &records,
        &shared,
        tasks::general_averages,
        |report, averages| report.general_averages = averages,
    ));

    handles.push(spawn_facet(
        "branch averages",
        &records,
        &shared,
        move |records| tasks::branch_averages(records, &filter),
        |report, averages| report.branch_averages = averages,
    ));

    for quantity in Quantity::ALL {
        handles.push(spawn_facet(
            quantity.name(),
            &records,
            &shared,
            move |records| tasks::component_toppers(records, quantity),
            move |report, toppers| {
                report.component_toppers.insert(quantity, toppers);
            },
        ));
    }

    handles.push(spawn_facet(
        "discrepancies",
        &records,
        &shared,
        tasks::discrepancies,
        |report, found| report.discrepancies = found,
    ));

    debug!(
        "Launched {} aggregation tasks over {} records",
        handles.len(),
        records.len()
    );

    for outcome in join_all(handles).await {
        if let Err(e) = outcome {
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic());
            }
            panic!("aggregation task did not complete: {}", e);
        }
    }

    debug!("All aggregation tasks completed");

    let mut report = shared.lock().unwrap_or_else(PoisonError::into_inner);
    std::mem::take(&mut *report)
}

/// Run `compute` on the blocking pool and store its output with `write`.
///
/// The lock is taken only once the facet is fully computed.
fn spawn_facet<T, C, W>(
    facet: &'static str,
    records: &Arc<[Record]>,
    shared: &SharedReport,
    compute: C,
    write: W,
) -> JoinHandle<()>
where
    T: Send + 'static,
    C: FnOnce(&[Record]) -> T + Send + 'static,
    W: FnOnce(&mut SummaryReport, T) + Send + 'static,
{
    let records = Arc::clone(records);
    let shared = Arc::clone(shared);

    tokio::task::spawn_blocking(move || {
        let value = compute(&records);

        let mut report = shared.lock().unwrap_or_else(PoisonError::into_inner);
        write(&mut report, value);
        debug!("Facet written: {}", facet);
    })
}
