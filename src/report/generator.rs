//! Report rendering.
//!
//! This module renders a [`ReportDocument`] as the plain-text console
//! summary, as Markdown, or as JSON.

use crate::config::MaxMarks;
use crate::models::{ComponentRank, Quantity, Record, ReportDocument, SummaryReport};
use anyhow::{Context, Result};
use std::path::Path;

/// Render the console report.
pub fn generate_text_report(document: &ReportDocument, max_marks: &MaxMarks) -> String {
    let summary = &document.summary;
    let mut out = String::new();

    out.push_str("========== GRADE ANALYSIS REPORT ==========\n");
    out.push_str(&format!(
        "Total Records Processed: {}\n\n",
        document.metadata.record_count
    ));

    out.push_str("=== DISCREPANCIES ===\n");
    if summary.discrepancies.is_empty() {
        out.push_str("No discrepancies found.\n");
    } else {
        out.push_str(&format!(
            "Found {} discrepancies:\n",
            summary.discrepancies.len()
        ));
        for (i, record) in summary.discrepancies.iter().enumerate() {
            out.push_str(&format!(
                "{}. Emplid: {}, Name: {}\n",
                i + 1,
                record.id(),
                record.name()
            ));
            out.push_str(&format!(
                "   Given Total: {:.2}, Computed Total: {:.2}, Difference: {:.2}\n",
                record.total_given(),
                record.total_computed(),
                record.difference()
            ));
        }
    }
    out.push('\n');

    out.push_str("=== GENERAL AVERAGES ===\n");
    for (quantity, average) in &summary.general_averages {
        out.push_str(&format!(
            "{}: {:.2} / {:.0} ({:.2}%)\n",
            quantity,
            average,
            max_marks.get(*quantity),
            max_marks.percentage(*quantity, *average)
        ));
    }
    out.push('\n');

    out.push_str(&format!(
        "=== BRANCH-WISE AVERAGES ({} Single Degree) ===\n",
        document.metadata.cohort_marker
    ));
    if summary.branch_averages.is_empty() {
        out.push_str("No branch data available.\n");
    } else {
        for (branch, average) in &summary.branch_averages {
            out.push_str(&format!(
                "{}: {:.2} / {:.0} ({:.2}%)\n",
                branch,
                average,
                max_marks.get(Quantity::Total),
                max_marks.percentage(Quantity::Total, *average)
            ));
        }
    }
    out.push('\n');

    out.push_str("=== TOP 3 STUDENTS BY COMPONENT ===\n");
    for quantity in Quantity::ALL {
        out.push_str(&format!("--- {} ---\n", quantity));
        let toppers = toppers_for(summary, quantity);

        if toppers.is_empty() {
            out.push_str("No data available.\n");
            continue;
        }

        for topper in toppers {
            out.push_str(&format!(
                "{}: {} ({}) - {:.2} / {:.0} ({:.2}%)\n",
                ordinal(topper.rank),
                topper.name,
                topper.id,
                topper.marks,
                max_marks.get(quantity),
                max_marks.percentage(quantity, topper.marks)
            ));
        }
        out.push('\n');
    }

    out
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(document: &ReportDocument, max_marks: &MaxMarks) -> String {
    let mut output = String::new();

    output.push_str("# Grade Analysis Report\n\n");
    output.push_str(&generate_metadata_section(document));
    output.push_str(&generate_discrepancy_section(&document.summary.discrepancies));
    output.push_str(&generate_averages_section(&document.summary, max_marks));
    output.push_str(&generate_branch_section(document, max_marks));
    output.push_str(&generate_toppers_section(&document.summary, max_marks));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(document: &ReportDocument) -> String {
    let metadata = &document.metadata;
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records:** {}\n", metadata.record_count));
    if let Some(ref class) = metadata.class_filter {
        section.push_str(&format!("- **Class:** {}\n", class));
    }
    section.push_str(&format!("- **Cohort:** {}\n", metadata.cohort_marker));
    section.push('\n');

    section
}

fn generate_discrepancy_section(discrepancies: &[Record]) -> String {
    let mut section = String::new();

    section.push_str("## Discrepancies\n\n");

    if discrepancies.is_empty() {
        section.push_str("No discrepancies found.\n\n");
        return section;
    }

    section.push_str("| # | Emplid | Name | Given | Computed | Difference |\n");
    section.push_str("|:---:|:---|:---|---:|---:|---:|\n");

    for (i, record) in discrepancies.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {:.2} | {:.2} | {:.2} |\n",
            i + 1,
            record.id(),
            record.name(),
            record.total_given(),
            record.total_computed(),
            record.difference()
        ));
    }
    section.push('\n');

    section
}

fn generate_averages_section(summary: &SummaryReport, max_marks: &MaxMarks) -> String {
    let mut section = String::new();

    section.push_str("## General Averages\n\n");
    section.push_str("| Component | Average | Max | Percentage |\n");
    section.push_str("|:---|---:|---:|---:|\n");

    for (quantity, average) in &summary.general_averages {
        section.push_str(&format!(
            "| {} | {:.2} | {:.0} | {:.2}% |\n",
            quantity,
            average,
            max_marks.get(*quantity),
            max_marks.percentage(*quantity, *average)
        ));
    }
    section.push('\n');

    section
}

fn generate_branch_section(document: &ReportDocument, max_marks: &MaxMarks) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## Branch Averages ({} Single Degree)\n\n",
        document.metadata.cohort_marker
    ));

    let branches = &document.summary.branch_averages;
    if branches.is_empty() {
        section.push_str("No branch data available.\n\n");
        return section;
    }

    section.push_str("| Branch | Average | Percentage |\n");
    section.push_str("|:---|---:|---:|\n");

    for (branch, average) in branches {
        section.push_str(&format!(
            "| {} | {:.2} / {:.0} | {:.2}% |\n",
            branch,
            average,
            max_marks.get(Quantity::Total),
            max_marks.percentage(Quantity::Total, *average)
        ));
    }
    section.push('\n');

    section
}

fn generate_toppers_section(summary: &SummaryReport, max_marks: &MaxMarks) -> String {
    let mut section = String::new();

    section.push_str("## Top Students by Component\n\n");

    for quantity in Quantity::ALL {
        section.push_str(&format!("### {}\n\n", quantity));

        let toppers = toppers_for(summary, quantity);
        if toppers.is_empty() {
            section.push_str("No data available.\n\n");
            continue;
        }

        section.push_str("| Rank | Name | Emplid | Marks | Percentage |\n");
        section.push_str("|:---:|:---|:---|---:|---:|\n");

        for topper in toppers {
            section.push_str(&format!(
                "| {} | {} | {} | {:.2} / {:.0} | {:.2}% |\n",
                ordinal(topper.rank),
                topper.name,
                topper.id,
                topper.marks,
                max_marks.get(quantity),
                max_marks.percentage(quantity, topper.marks)
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by gradesheet*\n".to_string()
}

fn toppers_for(summary: &SummaryReport, quantity: Quantity) -> &[ComponentRank] {
    summary
        .component_toppers
        .get(&quantity)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// English ordinal for a rank.
fn ordinal(rank: usize) -> String {
    match rank {
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        n => format!("{}th", n),
    }
}

/// Generate a JSON report.
pub fn generate_json_report(document: &ReportDocument) -> Result<String> {
    serde_json::to_string_pretty(document).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
