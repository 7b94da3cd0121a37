use crate::WorkoutEntry;
use crate::loader::DATE_FORMAT;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

/// Write entries in the same column layout the loader accepts, so an
/// exported file can be loaded again. Missing fields become empty cells.
pub fn write_entries_csv<W: Write>(writer: W, entries: &[WorkoutEntry]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Workout Area", "Date", "Total Lifted", "Weight Left"])?;
    for e in entries {
        wtr.write_record([
            e.area.label().to_string(),
            e.timestamp
                .map(|t| t.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            e.weight_lifted.map(format_weight).unwrap_or_default(),
            e.weight_remaining.map(format_weight).unwrap_or_default(),
        ])?;
    }
    wtr.flush().map_err(Into::into)
}

/// Integral weights export without a decimal point, fractional ones keep
/// their full precision so a reload reproduces the value exactly.
fn format_weight(w: f64) -> String {
    if w.fract() == 0.0 {
        format!("{w:.0}")
    } else {
        format!("{w}")
    }
}

pub fn save_entries_csv<P: AsRef<Path>>(path: P, entries: &[WorkoutEntry]) -> csv::Result<()> {
    write_entries_csv(std::fs::File::create(path)?, entries)
}

pub fn save_entries_json<P: AsRef<Path>>(path: P, entries: &[WorkoutEntry]) -> std::io::Result<()> {
    write_json(entries, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::WorkoutArea;
    use crate::loader::{CellPolicy, load_entries};
    use chrono::NaiveDateTime;

    fn sample_entries() -> Vec<WorkoutEntry> {
        vec![
            WorkoutEntry {
                area: WorkoutArea::UpperLeg,
                timestamp: Some(
                    NaiveDateTime::parse_from_str("2024-03-14 18:30:00", "%Y-%m-%d %H:%M:%S")
                        .unwrap(),
                ),
                weight_lifted: Some(1_200.0),
                weight_remaining: Some(498_800.0),
            },
            WorkoutEntry {
                area: WorkoutArea::Back,
                timestamp: None,
                weight_lifted: None,
                weight_remaining: None,
            },
        ]
    }

    #[test]
    fn csv_export_uses_the_input_layout() {
        let mut buf = Vec::new();
        write_entries_csv(&mut buf, &sample_entries()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Workout Area,Date,Total Lifted,Weight Left\n"));
        assert!(text.contains("Upper leg,\"March 14, 2024 at 06:30:00 PM\",1200,498800"));
        assert!(text.contains("Back,,,"));
    }

    #[test]
    fn csv_export_round_trips_through_the_loader() {
        let entries = sample_entries();
        let mut buf = Vec::new();
        write_entries_csv(&mut buf, &entries).unwrap();
        let report = load_entries(buf.as_slice(), CellPolicy::CoerceToMissing).unwrap();
        // the loader sorts missing timestamps first
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0], entries[1]);
        assert_eq!(report.entries[1], entries[0]);
        assert_eq!(report.coerced_cells, 0);
    }

    #[test]
    fn fractional_weights_survive_the_round_trip() {
        let entries = vec![WorkoutEntry {
            area: WorkoutArea::Calf,
            timestamp: Some(
                NaiveDateTime::parse_from_str("2024-03-14 18:30:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            ),
            weight_lifted: Some(12.5),
            weight_remaining: Some(499_987.5),
        }];
        let mut buf = Vec::new();
        write_entries_csv(&mut buf, &entries).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("12.5,499987.5"));
        let report = load_entries(buf.as_slice(), CellPolicy::CoerceToMissing).unwrap();
        assert_eq!(report.entries, entries);
    }

    #[test]
    fn json_export_writes_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.json");
        save_entries_json(&path, &sample_entries()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"UpperLeg\""));
        assert!(text.contains("498800.0"));
        assert!(text.contains("null"));
    }
}
