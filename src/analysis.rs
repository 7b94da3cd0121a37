// Module for aggregating the loaded workout table.
use crate::WorkoutEntry;
use crate::categories::WorkoutArea;
use crate::loader::LoadReport;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Progress toward the cumulative goal, derived from the last entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub total_lifted: f64,
    pub remaining: f64,
    /// Always in `[0, 1]`, even when the goal is overshot.
    pub fraction: f32,
}

/// Per-day aggregate used by the summary statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DayTotal {
    pub total: f64,
    pub sessions: usize,
}

/// Summary statistics over all workout days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub avg_per_day: f64,
    pub max_per_day: f64,
    pub day_count: usize,
}

/// Compute progress from the latest entry carrying a `Weight Left` value.
///
/// Returns `None` when no such entry exists, which the UI renders as a
/// "no data" state rather than an error.
pub fn progress_summary(entries: &[WorkoutEntry], goal: f64) -> Option<ProgressSummary> {
    let remaining = entries.iter().rev().find_map(|e| e.weight_remaining)?;
    let total_lifted = goal - remaining;
    let fraction = if goal > 0.0 {
        (total_lifted / goal).clamp(0.0, 1.0) as f32
    } else {
        0.0
    };
    Some(ProgressSummary {
        total_lifted,
        remaining,
        fraction,
    })
}

/// Sum of weight lifted grouped by workout area. Entries with a missing
/// lifted value are skipped.
pub fn totals_by_area(entries: &[WorkoutEntry]) -> HashMap<WorkoutArea, f64> {
    let mut map: HashMap<WorkoutArea, f64> = HashMap::new();
    for e in entries {
        if let Some(w) = e.weight_lifted {
            *map.entry(e.area).or_insert(0.0) += w;
        }
    }
    map
}

/// Sum of weight lifted grouped by ISO week, keyed `(iso_year, iso_week)`.
///
/// Entries with a missing timestamp or lifted value are skipped.
pub fn weekly_totals(entries: &[WorkoutEntry]) -> BTreeMap<(i32, u32), f64> {
    let mut map: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for e in entries {
        if let (Some(ts), Some(w)) = (e.timestamp, e.weight_lifted) {
            let week = ts.date().iso_week();
            *map.entry((week.year(), week.week())).or_insert(0.0) += w;
        }
    }
    map
}

/// Per-day sum of weight lifted and count of entries, grouped by calendar
/// date. Entries with a missing timestamp are excluded entirely.
pub fn daily_totals(entries: &[WorkoutEntry]) -> BTreeMap<NaiveDate, DayTotal> {
    let mut map: BTreeMap<NaiveDate, DayTotal> = BTreeMap::new();
    for e in entries {
        if let Some(ts) = e.timestamp {
            let day = map.entry(ts.date()).or_default();
            day.total += e.weight_lifted.unwrap_or(0.0);
            day.sessions += 1;
        }
    }
    map
}

/// Mean and max of the per-day totals plus the count of distinct days.
pub fn daily_stats(entries: &[WorkoutEntry]) -> Option<DailyStats> {
    let days = daily_totals(entries);
    if days.is_empty() {
        return None;
    }
    let sum: f64 = days.values().map(|d| d.total).sum();
    let max = days
        .values()
        .map(|d| d.total)
        .fold(f64::NEG_INFINITY, f64::max);
    Some(DailyStats {
        avg_per_day: sum / days.len() as f64,
        max_per_day: max,
        day_count: days.len(),
    })
}

/// Format a weight as whole pounds with `,` thousands separators.
pub fn format_lbs(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let mut digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::new();
    while digits.len() > 3 {
        let chunk = digits.split_off(digits.len() - 3);
        grouped = if grouped.is_empty() {
            chunk
        } else {
            format!("{chunk},{grouped}")
        };
    }
    let mut out = if grouped.is_empty() {
        digits
    } else {
        format!("{digits},{grouped}")
    };
    if negative {
        out.insert(0, '-');
    }
    out
}

/// Status-bar message after a load, including any skipped-row count.
pub fn format_load_message(report: &LoadReport, filename: &str) -> String {
    let mut msg = format!("Loaded {} entries from {}", report.entries.len(), filename);
    if report.skipped_rows > 0 {
        msg.push_str(&format!(", {} rows skipped", report.skipped_rows));
    }
    if report.coerced_cells > 0 {
        msg.push_str(&format!(", {} unreadable cells", report.coerced_cells));
    }
    msg
}
