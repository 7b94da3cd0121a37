use crate::{
    WorkoutEntry,
    analysis::{DailyStats, ProgressSummary, format_lbs, totals_by_area},
    categories::ALL_AREAS,
    plotting::remaining_over_time_points,
};
use maud::{Markup, html};
use plotters::prelude::*;
use std::path::Path;

/// Write a standalone HTML progress report next to a PNG chart of the weight
/// remaining over time.
pub fn export_html_report<P: AsRef<Path>>(
    path: P,
    entries: &[WorkoutEntry],
    progress: Option<&ProgressSummary>,
    daily: Option<&DailyStats>,
) -> std::io::Result<()> {
    let path = path.as_ref();
    let chart_path = path.with_extension("png");
    let chart_file = match generate_remaining_chart(entries, &chart_path) {
        Ok(_) => chart_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("")),
        Err(e) => {
            log::error!("Failed to generate chart: {e}");
            std::ffi::OsStr::new("")
        }
    };
    let markup = build_html(entries, progress, daily, chart_file);
    std::fs::write(path, markup.into_string())
}

fn generate_remaining_chart(
    entries: &[WorkoutEntry],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let points = remaining_over_time_points(entries);
    let root = BitMapBackend::new(path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;
    if points.is_empty() {
        root.present()?;
        return Ok(());
    }
    let x_min = points[0][0];
    let x_max = points[points.len() - 1][0].max(x_min + 1.0);
    let y_max = points.iter().map(|p| p[1]).fold(0.0_f64, f64::max).max(1.0);
    let mut chart = ChartBuilder::on(&root)
        .caption("Weight Remaining Over Time", ("sans-serif", 25))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Day")
        .y_desc("Weight Left (lbs)")
        .draw()?;
    chart.draw_series(LineSeries::new(points.iter().map(|p| (p[0], p[1])), &BLUE))?;
    root.present()?;
    Ok(())
}

fn build_html(
    entries: &[WorkoutEntry],
    progress: Option<&ProgressSummary>,
    daily: Option<&DailyStats>,
    chart_file: &std::ffi::OsStr,
) -> Markup {
    let totals = totals_by_area(entries);
    let by_area: Vec<(&str, f64)> = ALL_AREAS
        .into_iter()
        .filter_map(|a| totals.get(&a).map(|t| (a.label(), *t)))
        .collect();
    html! {
        html {
            head { meta charset="utf-8"; title { "Workout Progress Report" } }
            body {
                h1 { "Progress" }
                @if let Some(p) = progress {
                    table border="1" {
                        tr { th { "Total Lifted" } td { (format_lbs(p.total_lifted)) " lbs" } }
                        tr { th { "Remaining" } td { (format_lbs(p.remaining)) " lbs" } }
                        tr { th { "Progress" } td { (format!("{:.1}%", p.fraction * 100.0)) } }
                    }
                } @else {
                    p { "No data" }
                }
                h1 { "Daily Summary" }
                @if let Some(d) = daily {
                    table border="1" {
                        tr { th { "Average per Day" } td { (format_lbs(d.avg_per_day)) " lbs" } }
                        tr { th { "Best Day" } td { (format_lbs(d.max_per_day)) " lbs" } }
                        tr { th { "Workout Days" } td { (d.day_count) } }
                    }
                } @else {
                    p { "No data" }
                }
                h1 { "Lifted by Area" }
                table border="1" {
                    tr { th { "Area" } th { "Total Lifted" } }
                    @for (label, total) in &by_area {
                        tr { td { (label) } td { (format_lbs(*total)) " lbs" } }
                    }
                }
                h1 { "Weight Remaining" }
                @if chart_file.is_empty() {
                    p { "Chart unavailable" }
                } @else {
                    img src=(chart_file.to_string_lossy());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::WorkoutArea;
    use chrono::NaiveDateTime;
    use std::ffi::OsStr;

    fn sample_entries() -> Vec<WorkoutEntry> {
        vec![WorkoutEntry {
            area: WorkoutArea::Chest,
            timestamp: Some(
                NaiveDateTime::parse_from_str("2024-01-01 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            ),
            weight_lifted: Some(1_500.0),
            weight_remaining: Some(498_500.0),
        }]
    }

    #[test]
    fn build_html_renders_metrics() {
        let progress = ProgressSummary {
            total_lifted: 1_500.0,
            remaining: 498_500.0,
            fraction: 0.003,
        };
        let daily = DailyStats {
            avg_per_day: 1_500.0,
            max_per_day: 1_500.0,
            day_count: 1,
        };
        let output = build_html(
            &sample_entries(),
            Some(&progress),
            Some(&daily),
            OsStr::new("report.png"),
        )
        .into_string();

        assert!(output.contains("1,500"));
        assert!(output.contains("498,500"));
        assert!(output.contains("0.3%"));
        assert!(output.contains("Chest"));
        assert!(output.contains("report.png"));
    }

    #[test]
    fn build_html_handles_empty_state() {
        let output = build_html(&[], None, None, OsStr::new("")).into_string();
        assert!(output.contains("No data"));
        assert!(output.contains("Chart unavailable"));
        assert!(!output.contains("<img"));
    }

    #[test]
    fn export_writes_html_and_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        let progress = ProgressSummary {
            total_lifted: 1_500.0,
            remaining: 498_500.0,
            fraction: 0.003,
        };
        export_html_report(&path, &sample_entries(), Some(&progress), None).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Workout Progress Report"));
    }
}
