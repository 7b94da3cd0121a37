use chrono::{Datelike, NaiveDateTime, Timelike};
use egui_plot::{Bar, BarChart, Line, PlotPoints};
use std::f64::consts::TAU;

use crate::WorkoutEntry;
use crate::analysis::{totals_by_area, weekly_totals};
use crate::categories::{ALL_AREAS, WorkoutArea};

/// One slice of the lifetime-totals pie chart.
///
/// Angles are radians measured clockwise from 12 o'clock; the slices of one
/// chart are contiguous and cover the full circle.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub area: WorkoutArea,
    pub value: f64,
    pub fraction: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

/// Map a timestamp onto the plot x axis: days from CE plus the day fraction,
/// so the axis formatter can recover the calendar date by rounding down.
fn day_value(ts: NaiveDateTime) -> f64 {
    ts.date().num_days_from_ce() as f64 + ts.time().num_seconds_from_midnight() as f64 / 86_400.0
}

/// Points for the weight-remaining time series. Entries missing either the
/// timestamp or the remaining value are skipped.
pub fn remaining_over_time_points(entries: &[WorkoutEntry]) -> Vec<[f64; 2]> {
    entries
        .iter()
        .filter_map(|e| match (e.timestamp, e.weight_remaining) {
            (Some(ts), Some(remaining)) => Some([day_value(ts), remaining]),
            _ => None,
        })
        .collect()
}

/// Line plot of weight remaining over time.
pub fn remaining_over_time_line(entries: &[WorkoutEntry]) -> Line {
    Line::new(PlotPoints::from(remaining_over_time_points(entries))).name("Weight Left")
}

/// Bar chart of weekly lifted totals plus the ISO week key for each bar
/// index, for the axis formatter.
pub fn weekly_total_bars(entries: &[WorkoutEntry]) -> (BarChart, Vec<(i32, u32)>) {
    let totals = weekly_totals(entries);
    let keys: Vec<(i32, u32)> = totals.keys().copied().collect();
    let bars: Vec<Bar> = totals
        .values()
        .enumerate()
        .map(|(idx, total)| Bar::new(idx as f64, *total))
        .collect();
    (BarChart::new(bars).name("Weekly Total"), keys)
}

/// Slice geometry for the lifetime totals pie chart.
///
/// Areas with no lifted weight are omitted; the remaining slices appear in
/// the fixed area order. Empty when there is nothing to show.
pub fn pie_slices(entries: &[WorkoutEntry]) -> Vec<PieSlice> {
    let totals = totals_by_area(entries);
    let total: f64 = totals.values().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut slices = Vec::new();
    let mut angle = 0.0;
    for area in ALL_AREAS {
        let Some(&value) = totals.get(&area) else {
            continue;
        };
        if value <= 0.0 {
            continue;
        }
        let fraction = value / total;
        let end_angle = angle + fraction * TAU;
        slices.push(PieSlice {
            area,
            value,
            fraction,
            start_angle: angle,
            end_angle,
        });
        angle = end_angle;
    }
    slices
}

/// Stable color per workout area, shared by the pie chart and its legend.
pub fn area_color(area: WorkoutArea) -> egui::Color32 {
    match area {
        WorkoutArea::Shoulder => egui::Color32::from_rgb(102, 153, 255),
        WorkoutArea::Bicep => egui::Color32::from_rgb(255, 128, 102),
        WorkoutArea::Chest => egui::Color32::from_rgb(102, 204, 153),
        WorkoutArea::Tricep => egui::Color32::from_rgb(255, 204, 102),
        WorkoutArea::UpperLeg => egui::Color32::from_rgb(178, 128, 230),
        WorkoutArea::Calf => egui::Color32::from_rgb(230, 128, 178),
        WorkoutArea::Back => egui::Color32::from_rgb(128, 178, 178),
    }
}
