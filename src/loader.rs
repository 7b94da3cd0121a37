//! CSV loading and row normalization.

use crate::WorkoutEntry;
use crate::categories;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Timestamp format used by the spreadsheet, e.g.
/// `March 14, 2024 at 06:30:00 PM`.
pub const DATE_FORMAT: &str = "%B %d, %Y at %I:%M:%S %p";

/// File-level load failures. Row-level problems never surface here; they are
/// handled per cell according to the [`CellPolicy`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// What to do with a date or numeric cell that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellPolicy {
    /// Keep the row and record the cell as missing. Aggregations skip
    /// missing values.
    CoerceToMissing,
    /// Discard the whole row.
    DropRow,
}

impl Default for CellPolicy {
    fn default() -> Self {
        CellPolicy::CoerceToMissing
    }
}

/// Result of a load: the normalized table plus counts the UI can surface as a
/// non-fatal warning.
#[derive(Debug, Default, PartialEq)]
pub struct LoadReport {
    pub entries: Vec<WorkoutEntry>,
    pub skipped_rows: usize,
    pub coerced_cells: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRow {
    #[serde(rename = "Workout Area")]
    workout_area: Option<String>,
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "Total Lifted")]
    total_lifted: Option<String>,
    #[serde(rename = "Weight Left")]
    weight_left: Option<String>,
}

enum Cell<T> {
    Missing,
    Bad,
    Value(T),
}

impl<T> Cell<T> {
    fn is_bad(&self) -> bool {
        matches!(self, Cell::Bad)
    }

    fn into_option(self) -> Option<T> {
        match self {
            Cell::Value(v) => Some(v),
            _ => None,
        }
    }
}

fn classify<T>(raw: Option<&str>, parse: impl Fn(&str) -> Option<T>) -> Cell<T> {
    match raw.map(str::trim) {
        None | Some("") => Cell::Missing,
        Some(s) => parse(s).map_or(Cell::Bad, Cell::Value),
    }
}

fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(cell, DATE_FORMAT).ok()
}

/// Parse a weight cell, tolerating `,` thousands separators.
fn parse_weight(cell: &str) -> Option<f64> {
    let cleaned: String = cell.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Load workout entries from a delimited text table.
///
/// Header and field whitespace is trimmed. Rows with a blank `Workout Area`
/// or the sentinel `Totals` marker are discarded silently; rows naming an
/// unknown area are discarded with a warning. Malformed date/numeric cells
/// are handled per `policy`. The returned entries are sorted ascending by
/// timestamp, with missing timestamps ordered first.
pub fn load_entries<R: Read>(reader: R, policy: CellPolicy) -> Result<LoadReport, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    rdr.headers()?;

    let mut report = LoadReport::default();
    for result in rdr.deserialize::<RawRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("Skipping unreadable row: {err}");
                report.skipped_rows += 1;
                continue;
            }
        };

        let area_raw = raw.workout_area.as_deref().map(str::trim).unwrap_or("");
        if area_raw.is_empty() || area_raw == "Totals" {
            continue;
        }
        let Some(area) = categories::area_for(area_raw) else {
            match categories::closest_area(area_raw) {
                Some(suggestion) => log::warn!(
                    "Skipping row with unknown workout area {area_raw:?} (closest match: {suggestion})"
                ),
                None => log::warn!("Skipping row with unknown workout area {area_raw:?}"),
            }
            report.skipped_rows += 1;
            continue;
        };

        let timestamp = classify(raw.date.as_deref(), parse_timestamp);
        let lifted = classify(raw.total_lifted.as_deref(), parse_weight);
        let remaining = classify(raw.weight_left.as_deref(), parse_weight);

        let bad_cells = [timestamp.is_bad(), lifted.is_bad(), remaining.is_bad()]
            .into_iter()
            .filter(|b| *b)
            .count();
        if bad_cells > 0 {
            match policy {
                CellPolicy::DropRow => {
                    report.skipped_rows += 1;
                    continue;
                }
                CellPolicy::CoerceToMissing => report.coerced_cells += bad_cells,
            }
        }

        report.entries.push(WorkoutEntry {
            area,
            timestamp: timestamp.into_option(),
            weight_lifted: lifted.into_option(),
            weight_remaining: remaining.into_option(),
        });
    }

    report.entries.sort_by_key(|e| e.timestamp);
    Ok(report)
}

/// Load workout entries from a CSV file on disk.
pub fn load_entries_from_path<P: AsRef<Path>>(
    path: P,
    policy: CellPolicy,
) -> Result<LoadReport, LoadError> {
    let file = std::fs::File::open(path)?;
    load_entries(file, policy)
}
