//! Data models for the grade-sheet analyzer.
//!
//! This module contains the student record, the fixed set of scored
//! quantities, and the summary report produced by the aggregation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tolerance used when comparing the given total with the recomputed one.
pub const DISCREPANCY_EPSILON: f64 = 0.01;

/// One of the seven scored quantities of a grade sheet.
///
/// The declaration order is the order used everywhere a report lists
/// quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quantity {
    Quiz,
    MidSem,
    LabTest,
    WeeklyLabs,
    PreCompre,
    Compre,
    Total,
}

/// Projection from a record to the marks of one quantity.
pub type Projection = fn(&Record) -> f64;

/// Quantity to projection lookup, indexed by `Quantity as usize`.
static PROJECTIONS: [Projection; 7] = [
    |r: &Record| r.marks.quiz,
    |r: &Record| r.marks.mid_sem,
    |r: &Record| r.marks.lab_test,
    |r: &Record| r.marks.weekly_labs,
    |r: &Record| r.marks.pre_compre,
    |r: &Record| r.marks.compre,
    |r: &Record| r.total_given,
];

impl Quantity {
    /// All quantities in report order.
    pub const ALL: [Quantity; 7] = [
        Quantity::Quiz,
        Quantity::MidSem,
        Quantity::LabTest,
        Quantity::WeeklyLabs,
        Quantity::PreCompre,
        Quantity::Compre,
        Quantity::Total,
    ];

    /// Returns the projection that reads this quantity off a record.
    pub fn projection(self) -> Projection {
        PROJECTIONS[self as usize]
    }

    /// Marks of this quantity for one record.
    pub fn marks(self, record: &Record) -> f64 {
        (self.projection())(record)
    }

    /// Canonical name, as used in report keys.
    pub fn name(self) -> &'static str {
        match self {
            Quantity::Quiz => "Quiz",
            Quantity::MidSem => "MidSem",
            Quantity::LabTest => "LabTest",
            Quantity::WeeklyLabs => "WeeklyLabs",
            Quantity::PreCompre => "PreCompre",
            Quantity::Compre => "Compre",
            Quantity::Total => "Total",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who a record belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentIdentity {
    /// Opaque student identifier. Not required to be unique.
    pub id: String,
    pub name: String,
    /// Cohort label, e.g. "CS" or "CS & EEE" for a dual program.
    pub branch: String,
    /// Intake label, e.g. "2024 Batch".
    pub batch: String,
    /// Class section.
    pub class_group: String,
}

/// The six scored components of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMarks {
    pub quiz: f64,
    pub mid_sem: f64,
    pub lab_test: f64,
    pub weekly_labs: f64,
    pub pre_compre: f64,
    pub compre: f64,
}

impl ComponentMarks {
    /// Sum of all six components.
    pub fn sum(&self) -> f64 {
        self.quiz + self.mid_sem + self.lab_test + self.weekly_labs + self.pre_compre + self.compre
    }
}

/// A validated student grade entry.
///
/// The computed total and the discrepancy flag are derived in [`Record::new`]
/// and cannot be set independently of the marks they describe.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(flatten)]
    pub identity: StudentIdentity,
    #[serde(flatten)]
    marks: ComponentMarks,
    total_given: f64,
    total_computed: f64,
    has_discrepancy: bool,
}

impl Record {
    /// Build a record, recomputing its total from the components.
    pub fn new(identity: StudentIdentity, marks: ComponentMarks, total_given: f64) -> Self {
        let total_computed = marks.sum();
        let has_discrepancy = (total_given - total_computed).abs() > DISCREPANCY_EPSILON;

        Self {
            identity,
            marks,
            total_given,
            total_computed,
            has_discrepancy,
        }
    }

    pub fn id(&self) -> &str {
        &self.identity.id
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Total as recorded in the source sheet.
    pub fn total_given(&self) -> f64 {
        self.total_given
    }

    /// Sum of the six components.
    pub fn total_computed(&self) -> f64 {
        self.total_computed
    }

    pub fn has_discrepancy(&self) -> bool {
        self.has_discrepancy
    }

    /// Signed difference between the given and the computed total.
    pub fn difference(&self) -> f64 {
        self.total_given - self.total_computed
    }
}

/// One entry of a per-quantity ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRank {
    pub id: String,
    pub name: String,
    pub marks: f64,
    /// 1-based position within the ranking.
    pub rank: usize,
}

/// The merged result of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    /// Mean of each quantity across all records.
    pub general_averages: BTreeMap<Quantity, f64>,
    /// Mean given total per branch, restricted to the cohort filter.
    pub branch_averages: BTreeMap<String, f64>,
    /// Top entries per quantity, best first.
    pub component_toppers: BTreeMap<Quantity, Vec<ComponentRank>>,
    /// Records whose given total disagrees with the computed one, in input order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discrepancies: Vec<Record>,
}

/// Metadata describing where a report came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// File path or URL the sheet was read from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    /// Number of records that reached aggregation.
    pub record_count: usize,
    /// Class filter applied while parsing, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_filter: Option<String>,
    /// Batch marker used for the branch averages.
    pub cohort_marker: String,
}

/// A report together with its metadata, as exported.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub metadata: ReportMetadata,
    #[serde(flatten)]
    pub summary: SummaryReport,
}
