//! Grade sheet parsing.
//!
//! Turns the rows of a CSV grade sheet into validated [`Record`]s. Title and
//! header rows above the data are skipped, malformed rows are logged and
//! dropped.

use crate::models::{ComponentMarks, Record, StudentIdentity};
use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Column positions in the sheet.
mod col {
    pub const ID: usize = 0;
    pub const NAME: usize = 1;
    pub const BRANCH: usize = 2;
    pub const BATCH: usize = 3;
    pub const CLASS: usize = 4;
    pub const QUIZ: usize = 5;
    pub const MID_SEM: usize = 6;
    pub const LAB_TEST: usize = 7;
    pub const WEEKLY_LABS: usize = 8;
    pub const PRE_COMPRE: usize = 9;
    pub const COMPRE: usize = 10;
    pub const TOTAL: usize = 11;
}

/// Errors raised while parsing a grade sheet.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid {field} mark: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("no valid records found in the sheet")]
    NoValidRecords,
}

/// One decoded row of the sheet with its 1-based line number in the file.
#[derive(Debug)]
struct SheetRow {
    line: u64,
    cells: StringRecord,
}

/// Parse every data row of a sheet.
///
/// When `class_filter` is set, only records of that class section are kept.
/// Fails with [`ParseError::NoValidRecords`] if nothing survives.
pub fn parse_sheet(data: &[u8], class_filter: Option<&str>) -> Result<Vec<Record>, ParseError> {
    let (rows, mut skipped) = read_rows(data)?;
    let start = find_data_start(&rows);
    if let Some(first) = rows.get(start) {
        debug!("Data rows start at line {}", first.line);
    }

    let mut records = Vec::new();

    for row in rows.iter().skip(start) {
        if row.cells.len() <= col::TOTAL || cell(&row.cells, col::ID).is_empty() {
            continue;
        }

        let record = match parse_record(&row.cells) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping row {} - {}", row.line, e);
                skipped += 1;
                continue;
            }
        };

        if let Some(class) = class_filter {
            if record.identity.class_group != class {
                continue;
            }
        }

        records.push(record);
    }

    if records.is_empty() {
        return Err(ParseError::NoValidRecords);
    }

    info!(
        "Parsed {} records ({} rows skipped)",
        records.len(),
        skipped
    );
    Ok(records)
}

/// Read and decode all rows. Rows that are not valid UTF-8 are logged and
/// dropped; their count is returned alongside the rows.
fn read_rows(data: &[u8]) -> Result<(Vec<SheetRow>, usize), ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.byte_records() {
        let raw = result?;
        let line = raw.position().map(|p| p.line()).unwrap_or(0);

        match StringRecord::from_byte_record(raw) {
            Ok(cells) => rows.push(SheetRow { line, cells }),
            Err(e) => {
                warn!("Skipping row {} - {}", line, e);
                skipped += 1;
            }
        }
    }

    Ok((rows, skipped))
}

/// Index of the first row whose id cell is numeric, or 0 if there is none.
fn find_data_start(rows: &[SheetRow]) -> usize {
    rows.iter()
        .position(|row| is_numeric(cell(&row.cells, col::ID)))
        .unwrap_or(0)
}

/// Parse a single row into a record.
pub fn parse_record(row: &StringRecord) -> Result<Record, ParseError> {
    let identity = StudentIdentity {
        id: cell(row, col::ID).to_string(),
        name: cell(row, col::NAME).to_string(),
        branch: cell(row, col::BRANCH).to_string(),
        batch: cell(row, col::BATCH).to_string(),
        class_group: cell(row, col::CLASS).to_string(),
    };

    let marks = ComponentMarks {
        quiz: parse_mark(row, col::QUIZ, "Quiz")?,
        mid_sem: parse_mark(row, col::MID_SEM, "MidSem")?,
        lab_test: parse_mark(row, col::LAB_TEST, "LabTest")?,
        weekly_labs: parse_mark(row, col::WEEKLY_LABS, "WeeklyLabs")?,
        pre_compre: parse_mark(row, col::PRE_COMPRE, "PreCompre")?,
        compre: parse_mark(row, col::COMPRE, "Compre")?,
    };
    let total_given = parse_mark(row, col::TOTAL, "Total")?;

    Ok(Record::new(identity, marks, total_given))
}

fn cell(row: &StringRecord, index: usize) -> &str {
    row.get(index).map(str::trim).unwrap_or("")
}

/// Parse a mark cell. Blank cells count as zero.
fn parse_mark(row: &StringRecord, index: usize, field: &'static str) -> Result<f64, ParseError> {
    let raw = cell(row, index);
    if raw.is_empty() {
        return Ok(0.0);
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ParseError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

fn is_numeric(s: &str) -> bool {
    s.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quantity;

    const SHEET: &str = "\
CS F111 Computer Programming,,,,,,,,,,,
Emplid,Name,Branch,Batch,Class,Quiz,MidSem,LabTest,WeeklyLabs,PreCompre,Compre,Total
41001,Asha Rao,CS,2024 Batch,L1,25,60,50,25,70,60,290
41002,Ben Das,CS & EEE,2024 Batch,L2,20,55,45,20,0,80,225
41003,Chitra Iyer,ME,2023 Batch,L1,18,,40,22,0,70,150
";

    #[test]
    fn test_parse_sheet_skips_title_and_header() {
        let records = parse_sheet(SHEET.as_bytes(), None).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id(), "41001");
        assert_eq!(records[0].identity.branch, "CS");
        assert_eq!(records[1].identity.branch, "CS & EEE");
        assert_eq!(records[0].total_computed(), 290.0);
        assert!(!records[0].has_discrepancy());
    }

    #[test]
    fn test_blank_mark_counts_as_zero() {
        let records = parse_sheet(SHEET.as_bytes(), None).unwrap();

        let chitra = &records[2];
        assert_eq!(Quantity::MidSem.marks(chitra), 0.0);
        assert_eq!(chitra.total_computed(), 150.0);
    }

    #[test]
    fn test_class_filter() {
        let records = parse_sheet(SHEET.as_bytes(), Some("L1")).unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["41001", "41003"]);
    }

    #[test]
    fn test_class_filter_matching_nothing() {
        let err = parse_sheet(SHEET.as_bytes(), Some("L9")).unwrap_err();
        assert!(matches!(err, ParseError::NoValidRecords));
    }

    #[test]
    fn test_invalid_rows_are_skipped() {
        let sheet = "\
41001,Asha Rao,CS,2024,L1,25,60,50,25,70,60,290
41002,Ben Das,CS,2024,L1,abs,60,50,25,70,60,265
41003,Short Row,CS,2024
,No Id,CS,2024,L1,25,60,50,25,70,60,290
41004,Neg Mark,CS,2024,L1,-5,60,50,25,70,60,260
41005,Dev Jain,CS,2024,L1,30,60,50,25,70,60,295
";
        let records = parse_sheet(sheet.as_bytes(), None).unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["41001", "41005"]);
    }

    #[test]
    fn test_parse_record_reports_field() {
        let row = StringRecord::from(vec![
            "41001", "Asha Rao", "CS", "2024", "L1", "25", "x", "50", "25", "70", "60", "290",
        ]);

        let err = parse_record(&row).unwrap_err();
        assert_eq!(err.to_string(), "invalid MidSem mark: \"x\"");
    }

    #[test]
    fn test_discrepancy_flag_from_sheet() {
        let sheet = "41001,Asha Rao,CS,2024,L1,25,60,50,25,70,60,295\n";
        let records = parse_sheet(sheet.as_bytes(), None).unwrap();

        assert!(records[0].has_discrepancy());
        assert_eq!(format!("{:.2}", records[0].difference()), "5.00");
    }

    #[test]
    fn test_header_only_sheet() {
        let sheet = "Emplid,Name,Branch,Batch,Class,Quiz,MidSem,LabTest,WeeklyLabs,PreCompre,Compre,Total\n";
        assert!(matches!(
            parse_sheet(sheet.as_bytes(), None),
            Err(ParseError::NoValidRecords)
        ));
    }

    #[test]
    fn test_row_with_invalid_utf8_is_skipped() {
        let sheet: &[u8] = b"\
41001,Asha Rao,CS,2024,L1,25,60,50,25,70,60,290
41002,Jos\xe9 Pe\xf1a,CS,2024,L1,20,55,45,20,0,80,220
41003,Dev Jain,CS,2024,L1,30,60,50,25,70,60,295
";
        let records = parse_sheet(sheet, None).unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["41001", "41003"]);
    }

    #[test]
    fn test_rows_keep_file_line_numbers() {
        let sheet = "\
41001,Asha Rao,CS,2024,L1,25,60,50,25,70,60,290


41002,Ben Das,CS,2024,L1,abs,60,50,25,70,60,265
";
        let (rows, skipped) = read_rows(sheet.as_bytes()).unwrap();

        assert_eq!(skipped, 0);
        let lines: Vec<u64> = rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![1, 4]);
    }
}
