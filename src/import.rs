// 📂 CSV Import - period history from a spreadsheet export
//
// Expected headers: start,end (YYYY-MM-DD). Rows with either cell blank are
// treated like an unfinished form row and skipped.

use crate::period::{PeriodHistory, PeriodRange, DATE_FORMAT};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PeriodRow {
    start: Option<String>,
    end: Option<String>,
}

pub fn load_periods(csv_path: &Path) -> Result<PeriodHistory> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file: {:?}", csv_path))?;

    load_periods_from_reader(file)
}

pub fn load_periods_from_reader<R: Read>(reader: R) -> Result<PeriodHistory> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut ranges = Vec::new();
    let mut skipped = 0usize;

    for (index, result) in rdr.deserialize().enumerate() {
        // header is line 1
        let line = index + 2;
        let row: PeriodRow = result.with_context(|| format!("Failed to read period row on line {}", line))?;

        match (non_empty(row.start), non_empty(row.end)) {
            (Some(start), Some(end)) => {
                let start = parse_date(&start).with_context(|| format!("Bad start date on line {}", line))?;
                let end = parse_date(&end).with_context(|| format!("Bad end date on line {}", line))?;
                ranges.push(PeriodRange::new(start, end));
            }
            _ => skipped += 1,
        }
    }

    debug!(loaded = ranges.len(), skipped, "periods loaded from CSV");

    Ok(PeriodHistory::new(ranges))
}

fn non_empty(cell: Option<String>) -> Option<String> {
    cell.filter(|s| !s.is_empty())
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {}", value))
}
