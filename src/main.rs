//! Main application logic and persistent user settings.

use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use egui_extras::DatePickerButton;
use egui_plot::{Legend, Plot};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::info;

mod analysis;
use analysis::{daily_stats, format_lbs, format_load_message, progress_summary};
mod categories;
use categories::{ALL_AREAS, WorkoutArea};
mod export;
use export::{save_entries_csv, save_entries_json};
mod loader;
use loader::{CellPolicy, load_entries, load_entries_from_path};
mod plotting;
use plotting::{PieSlice, area_color, pie_slices, remaining_over_time_line, weekly_total_bars};
mod report;
use report::export_html_report;
mod session;
use session::{GOAL_WEIGHT_LBS, SessionState};

/// One logged workout record.
///
/// Date and numeric fields are optional because the loader coerces malformed
/// cells to missing values; aggregations skip them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub area: WorkoutArea,
    pub timestamp: Option<NaiveDateTime>,
    pub weight_lifted: Option<f64>,
    pub weight_remaining: Option<f64>,
}

fn default_plot_width() -> f32 {
    420.0
}

fn default_plot_height() -> f32 {
    220.0
}

/// Persistent configuration for user preferences and panel visibility.
///
/// Serialized to a JSON file in the platform config directory so choices
/// survive across restarts. Fields added later carry `#[serde(default)]` so
/// older configuration files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Settings {
    show_remaining_plot: bool,
    show_area_breakdown: bool,
    show_weekly_totals: bool,
    show_history: bool,
    show_daily_summary: bool,
    #[serde(default = "default_plot_width")]
    plot_width: f32,
    #[serde(default = "default_plot_height")]
    plot_height: f32,
    /// How the loader treats malformed date/numeric cells.
    #[serde(default)]
    cell_policy: CellPolicy,
    auto_load_last: bool,
    last_file: Option<String>,
    sort_column: SortColumn,
    sort_ascending: bool,
}

impl Settings {
    const FILE: &'static str = "workout_goal_tracker_settings.json";

    fn path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                if let Ok(cfg) = serde_json::from_str(&data) {
                    return cfg;
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(data) = serde_json::to_string_pretty(self) {
                let _ = std::fs::write(path, data);
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_remaining_plot: true,
            show_area_breakdown: true,
            show_weekly_totals: true,
            show_history: true,
            show_daily_summary: true,
            plot_width: default_plot_width(),
            plot_height: default_plot_height(),
            cell_policy: CellPolicy::default(),
            auto_load_last: true,
            last_file: None,
            sort_column: SortColumn::Date,
            sort_ascending: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum SortColumn {
    Date,
    Area,
    Lifted,
    Remaining,
}

/// Form inputs for one in-progress entry. `weight_to_add` is the increment
/// field; the running session total lives in [`SessionState`].
struct EntryForm {
    area: WorkoutArea,
    date: NaiveDate,
    time_text: String,
    weight_to_add: f64,
}

impl Default for EntryForm {
    fn default() -> Self {
        let now = Local::now();
        Self {
            area: WorkoutArea::Shoulder,
            date: now.date_naive(),
            time_text: now.format("%H:%M:%S").to_string(),
            weight_to_add: 0.0,
        }
    }
}

struct TrackerApp {
    session: SessionState,
    settings: Settings,
    form: EntryForm,
    last_loaded: Option<String>,
    load_warning: Option<String>,
    submit_error: Option<String>,
    toast_message: Option<String>,
    toast_start: Option<Instant>,
    sort_column: SortColumn,
    sort_ascending: bool,
    show_settings: bool,
    settings_dirty: bool,
}

impl Default for TrackerApp {
    fn default() -> Self {
        let settings = Settings::load();
        let mut app = Self {
            session: SessionState::new(GOAL_WEIGHT_LBS),
            sort_column: settings.sort_column,
            sort_ascending: settings.sort_ascending,
            settings,
            form: EntryForm::default(),
            last_loaded: None,
            load_warning: None,
            submit_error: None,
            toast_message: None,
            toast_start: None,
            show_settings: false,
            settings_dirty: false,
        };

        if app.settings.auto_load_last {
            if let Some(path) = app.settings.last_file.clone() {
                let p = std::path::Path::new(&path);
                if p.exists() {
                    app.load_csv_path(p);
                }
            }
        }

        app
    }
}

impl TrackerApp {
    fn show_toast(&mut self, message: String) {
        self.toast_message = Some(message);
        self.toast_start = Some(Instant::now());
    }

    /// Load a CSV from disk. File-level failures leave an empty table and a
    /// visible warning; the app stays usable for adding new entries.
    fn load_csv_path(&mut self, path: &std::path::Path) {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        match load_entries_from_path(path, self.settings.cell_policy) {
            Ok(report) => {
                let message = format_load_message(&report, &filename);
                info!("{message}");
                self.load_warning = (report.skipped_rows > 0 || report.coerced_cells > 0)
                    .then(|| message.clone());
                self.session.replace_entries(report.entries);
                self.last_loaded = Some(filename);
                self.settings.last_file = Some(path.display().to_string());
                self.settings_dirty = true;
                self.show_toast(message);
            }
            Err(err) => {
                log::warn!("Failed to load {filename}: {err}");
                self.session.replace_entries(Vec::new());
                self.load_warning = Some(format!("Error loading data: {err}"));
                self.last_loaded = Some(filename);
            }
        }
    }

    /// Load a CSV delivered as in-memory bytes (drag-and-drop without a path).
    fn load_csv_bytes(&mut self, name: &str, bytes: &[u8]) {
        match load_entries(Cursor::new(bytes), self.settings.cell_policy) {
            Ok(report) => {
                let message = format_load_message(&report, name);
                info!("{message}");
                self.load_warning = (report.skipped_rows > 0 || report.coerced_cells > 0)
                    .then(|| message.clone());
                self.session.replace_entries(report.entries);
                self.last_loaded = Some(name.to_string());
                self.show_toast(message);
            }
            Err(err) => {
                log::warn!("Failed to load {name}: {err}");
                self.session.replace_entries(Vec::new());
                self.load_warning = Some(format!("Error loading data: {err}"));
                self.last_loaded = Some(name.to_string());
            }
        }
    }

    fn submit_entry(&mut self) {
        match self
            .session
            .commit(self.form.area, self.form.date, &self.form.time_text)
        {
            Ok(entry) => {
                self.submit_error = None;
                let lifted = entry.weight_lifted.unwrap_or(0.0);
                self.show_toast(format!(
                    "Added {} lbs for {}",
                    format_lbs(lifted),
                    entry.area
                ));
                self.form = EntryForm::default();
            }
            Err(err) => {
                self.submit_error = Some(format!("Error adding workout: {err}"));
            }
        }
    }

    fn sort_button(
        ui: &mut egui::Ui,
        label: &str,
        column: SortColumn,
        sort_column: &mut SortColumn,
        sort_ascending: &mut bool,
    ) -> bool {
        let arrow = if *sort_column == column {
            if *sort_ascending { " \u{25B2}" } else { " \u{25BC}" }
        } else {
            ""
        };
        if ui.button(format!("{label}{arrow}")).clicked() {
            if *sort_column == column {
                *sort_ascending = !*sort_ascending;
            } else {
                *sort_column = column;
                *sort_ascending = true;
            }
            true
        } else {
            false
        }
    }

    fn sorted_entries(&self) -> Vec<&WorkoutEntry> {
        let mut rows: Vec<&WorkoutEntry> = self.session.entries().iter().collect();
        rows.sort_by(|a, b| {
            use std::cmp::Ordering;
            let ord = match self.sort_column {
                SortColumn::Date => a.timestamp.cmp(&b.timestamp),
                SortColumn::Area => a.area.cmp(&b.area),
                SortColumn::Lifted => a
                    .weight_lifted
                    .partial_cmp(&b.weight_lifted)
                    .unwrap_or(Ordering::Equal),
                SortColumn::Remaining => a
                    .weight_remaining
                    .partial_cmp(&b.weight_remaining)
                    .unwrap_or(Ordering::Equal),
            };
            if self.sort_ascending { ord } else { ord.reverse() }
        });
        rows
    }

    fn sync_settings_from_app(&mut self) {
        self.settings.sort_column = self.sort_column;
        self.settings.sort_ascending = self.sort_ascending;
    }

    fn metric(ui: &mut egui::Ui, label: &str, value: String) {
        ui.vertical(|ui| {
            ui.label(egui::RichText::new(label).small());
            ui.label(egui::RichText::new(value).strong().size(20.0));
        });
    }

    fn draw_pie(ui: &mut egui::Ui, slices: &[PieSlice], size: f32) {
        let (rect, _) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::hover());
        let painter = ui.painter_at(rect);
        let center = rect.center();
        let radius = size * 0.5 - 4.0;
        let point_at = |angle: f64| {
            egui::pos2(
                center.x + radius * angle.sin() as f32,
                center.y - radius * angle.cos() as f32,
            )
        };
        for slice in slices {
            let color = area_color(slice.area);
            let steps = 8.max((slice.fraction * 128.0).ceil() as usize);
            let span = slice.end_angle - slice.start_angle;
            // fan of triangles; a single polygon would not stay convex past 180 degrees
            for i in 0..steps {
                let a0 = slice.start_angle + span * i as f64 / steps as f64;
                let a1 = slice.start_angle + span * (i + 1) as f64 / steps as f64;
                painter.add(egui::Shape::convex_polygon(
                    vec![center, point_at(a0), point_at(a1)],
                    color,
                    egui::Stroke::NONE,
                ));
            }
        }
    }

    fn draw_progress_section(&self, ui: &mut egui::Ui) {
        let Some(progress) = progress_summary(self.session.entries(), self.session.goal()) else {
            ui.label("No data available. Please add your first workout!");
            return;
        };

        ui.horizontal(|ui| {
            Self::metric(
                ui,
                "Total Weight Lifted",
                format!("{} lbs", format_lbs(progress.total_lifted)),
            );
            ui.add_space(24.0);
            Self::metric(
                ui,
                "Remaining Weight",
                format!("{} lbs", format_lbs(progress.remaining)),
            );
        });
        ui.add(
            egui::ProgressBar::new(progress.fraction)
                .show_percentage()
                .desired_width(self.settings.plot_width),
        );

        if self.settings.show_remaining_plot {
            let line = remaining_over_time_line(self.session.entries());
            ui.label("Weight Remaining Over Time");
            Plot::new("remaining_plot")
                .width(self.settings.plot_width)
                .height(self.settings.plot_height)
                .x_axis_formatter(move |mark, _chars, _| {
                    NaiveDate::from_num_days_from_ce_opt(mark.value.round() as i32)
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| format!("{:.0}", mark.value))
                })
                .legend(Legend::default())
                .show(ui, |plot_ui| {
                    plot_ui.line(line);
                });
        }
    }

    fn draw_analytics_section(&self, ui: &mut egui::Ui) {
        ui.heading("Workout Analytics");
        if self.session.entries().is_empty() {
            ui.label("Add your first workout to see analytics!");
            return;
        }

        ui.horizontal_top(|ui| {
            if self.settings.show_area_breakdown {
                ui.vertical(|ui| {
                    ui.label("Total Weight Lifted by Workout Area");
                    let slices = pie_slices(self.session.entries());
                    if slices.is_empty() {
                        ui.label("No lifted weight recorded");
                    } else {
                        ui.horizontal(|ui| {
                            Self::draw_pie(ui, &slices, self.settings.plot_height);
                            ui.vertical(|ui| {
                                for slice in &slices {
                                    ui.horizontal(|ui| {
                                        ui.colored_label(area_color(slice.area), "\u{25A0}");
                                        ui.label(format!(
                                            "{}: {} lbs ({:.1}%)",
                                            slice.area,
                                            format_lbs(slice.value),
                                            slice.fraction * 100.0
                                        ));
                                    });
                                }
                            });
                        });
                    }
                });
            }

            if self.settings.show_weekly_totals {
                ui.vertical(|ui| {
                    ui.label("Weekly Progress");
                    let (chart, weeks) = weekly_total_bars(self.session.entries());
                    let labels: Vec<String> = weeks
                        .iter()
                        .map(|(year, week)| format!("{year}-W{week:02}"))
                        .collect();
                    Plot::new("weekly_plot")
                        .width(self.settings.plot_width)
                        .height(self.settings.plot_height)
                        .x_axis_formatter(move |mark, _chars, _| {
                            let idx = mark.value.round();
                            if (mark.value - idx).abs() > 0.25 || idx < 0.0 {
                                return String::new();
                            }
                            labels
                                .get(idx as usize)
                                .cloned()
                                .unwrap_or_default()
                        })
                        .show(ui, |plot_ui| {
                            plot_ui.bar_chart(chart);
                        });
                });
            }
        });
    }

    fn draw_history_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Historical Data");
        let mut sort_column = self.sort_column;
        let mut sort_ascending = self.sort_ascending;
        let mut changed = false;
        egui::Grid::new("history_grid").striped(true).show(ui, |ui| {
            changed |= Self::sort_button(ui, "Date", SortColumn::Date, &mut sort_column, &mut sort_ascending);
            changed |= Self::sort_button(ui, "Workout Area", SortColumn::Area, &mut sort_column, &mut sort_ascending);
            changed |= Self::sort_button(ui, "Total Lifted", SortColumn::Lifted, &mut sort_column, &mut sort_ascending);
            changed |= Self::sort_button(ui, "Weight Left", SortColumn::Remaining, &mut sort_column, &mut sort_ascending);
            ui.end_row();

            for entry in self.sorted_entries() {
                ui.label(
                    entry
                        .timestamp
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".into()),
                );
                ui.label(entry.area.label());
                ui.label(
                    entry
                        .weight_lifted
                        .map(format_lbs)
                        .unwrap_or_else(|| "-".into()),
                );
                ui.label(
                    entry
                        .weight_remaining
                        .map(format_lbs)
                        .unwrap_or_else(|| "-".into()),
                );
                ui.end_row();
            }
        });
        self.sort_column = sort_column;
        self.sort_ascending = sort_ascending;
        if changed {
            self.settings_dirty = true;
        }
    }

    fn draw_summary_section(&self, ui: &mut egui::Ui) {
        ui.heading("Summary Statistics");
        match daily_stats(self.session.entries()) {
            Some(stats) => {
                ui.horizontal(|ui| {
                    Self::metric(
                        ui,
                        "Average Weight per Day",
                        format!("{} lbs", format_lbs(stats.avg_per_day)),
                    );
                    ui.add_space(24.0);
                    Self::metric(
                        ui,
                        "Max Weight in a Day",
                        format!("{} lbs", format_lbs(stats.max_per_day)),
                    );
                    ui.add_space(24.0);
                    Self::metric(ui, "Total Workout Days", stats.day_count.to_string());
                });
            }
            None => {
                ui.label("No data");
            }
        }
    }

    fn draw_entry_form(&mut self, ui: &mut egui::Ui) {
        ui.heading("Add New Workout");
        egui::ComboBox::from_label("Workout Area")
            .selected_text(self.form.area.label())
            .show_ui(ui, |ui| {
                for area in ALL_AREAS {
                    ui.selectable_value(&mut self.form.area, area, area.label());
                }
            });
        ui.horizontal(|ui| {
            ui.label("Date:");
            ui.add(DatePickerButton::new(&mut self.form.date));
        });
        ui.horizontal(|ui| {
            ui.label("Time:");
            ui.text_edit_singleline(&mut self.form.time_text);
        });

        ui.separator();
        ui.label("Weight Calculator");
        ui.horizontal(|ui| {
            ui.add(
                egui::DragValue::new(&mut self.form.weight_to_add)
                    .clamp_range(0.0..=100_000.0)
                    .speed(5.0)
                    .suffix(" lbs"),
            );
            if ui.button("Add to Total").clicked() {
                self.session.add_weight(self.form.weight_to_add);
            }
        });
        Self::metric(
            ui,
            "Current Session Total",
            format!("{} lbs", format_lbs(self.session.session_total())),
        );

        ui.separator();
        if ui.button("Add Workout").clicked() {
            self.submit_entry();
        }
        if let Some(err) = &self.submit_error {
            ui.colored_label(egui::Color32::RED, err);
        }
    }

    fn draw_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        egui::Window::new("Settings")
            .open(&mut open)
            .show(ctx, |ui| {
                let s = &mut self.settings;
                let mut dirty = false;
                dirty |= ui
                    .checkbox(&mut s.show_remaining_plot, "Show remaining-weight chart")
                    .changed();
                dirty |= ui
                    .checkbox(&mut s.show_area_breakdown, "Show area breakdown")
                    .changed();
                dirty |= ui
                    .checkbox(&mut s.show_weekly_totals, "Show weekly totals")
                    .changed();
                dirty |= ui.checkbox(&mut s.show_history, "Show history table").changed();
                dirty |= ui
                    .checkbox(&mut s.show_daily_summary, "Show summary statistics")
                    .changed();
                dirty |= ui
                    .checkbox(&mut s.auto_load_last, "Load last CSV on startup")
                    .changed();
                ui.horizontal(|ui| {
                    ui.label("Plot size:");
                    dirty |= ui
                        .add(egui::DragValue::new(&mut s.plot_width).clamp_range(200.0..=1200.0))
                        .changed();
                    dirty |= ui
                        .add(egui::DragValue::new(&mut s.plot_height).clamp_range(100.0..=800.0))
                        .changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Unreadable cells:");
                    dirty |= ui
                        .selectable_value(
                            &mut s.cell_policy,
                            CellPolicy::CoerceToMissing,
                            "Keep row, mark missing",
                        )
                        .changed();
                    dirty |= ui
                        .selectable_value(&mut s.cell_policy, CellPolicy::DropRow, "Drop row")
                        .changed();
                });
                if dirty {
                    self.settings_dirty = true;
                }
            });
        self.show_settings = open;
    }

    fn draw_toast(&mut self, ctx: &egui::Context) {
        let expired = match self.toast_start {
            Some(start) => start.elapsed() > Duration::from_secs(3),
            None => true,
        };
        if expired {
            self.toast_start = None;
            self.toast_message = None;
            return;
        }
        if let Some(message) = &self.toast_message {
            egui::Window::new("toast")
                .title_bar(false)
                .resizable(false)
                .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
                .show(ctx, |ui| {
                    ui.label(message);
                });
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

impl App for TrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Handle CSV drag-and-drop
        for file in ctx.input(|i| i.raw.dropped_files.clone()) {
            let ext_ok = file
                .path
                .as_ref()
                .and_then(|p| p.extension())
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or_else(|| file.name.to_lowercase().ends_with(".csv"));
            if !ext_ok {
                continue;
            }
            if let Some(path) = file.path.clone() {
                self.load_csv_path(&path);
            } else if let Some(bytes) = file.bytes {
                let name = file.name.clone();
                self.load_csv_bytes(&name, &bytes);
            }
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Load CSV").clicked() {
                        if let Some(path) =
                            FileDialog::new().add_filter("CSV", &["csv"]).pick_file()
                        {
                            self.load_csv_path(&path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Export Entries").clicked() {
                        if let Some(path) = FileDialog::new()
                            .add_filter("CSV", &["csv"])
                            .add_filter("JSON", &["json"])
                            .save_file()
                        {
                            let result = match path
                                .extension()
                                .and_then(|e| e.to_str())
                                .map(|s| s.to_lowercase())
                            {
                                Some(ext) if ext == "json" => {
                                    save_entries_json(&path, self.session.entries())
                                        .map_err(|e| e.to_string())
                                }
                                _ => save_entries_csv(&path, self.session.entries())
                                    .map_err(|e| e.to_string()),
                            };
                            match result {
                                Ok(()) => self.show_toast("Entries exported".into()),
                                Err(e) => log::error!("Failed to export entries: {e}"),
                            }
                        }
                        ui.close_menu();
                    }
                    if ui.button("Export HTML Report").clicked() {
                        if let Some(path) = FileDialog::new()
                            .add_filter("HTML", &["html"])
                            .save_file()
                        {
                            let progress =
                                progress_summary(self.session.entries(), self.session.goal());
                            let daily = daily_stats(self.session.entries());
                            match export_html_report(
                                &path,
                                self.session.entries(),
                                progress.as_ref(),
                                daily.as_ref(),
                            ) {
                                Ok(()) => {
                                    self.show_toast("Report exported".into());
                                    if let Err(e) = open::that(&path) {
                                        log::warn!("Failed to open report: {e}");
                                    }
                                }
                                Err(e) => log::error!("Failed to export report: {e}"),
                            }
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Settings").clicked() {
                        self.show_settings = true;
                        ui.close_menu();
                    }
                });
                if let Some(name) = &self.last_loaded {
                    ui.separator();
                    ui.label(name);
                }
            });
        });

        egui::SidePanel::right("entry_panel").show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.draw_entry_form(ui);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Workout Progress Tracker");
                ui.label(format!(
                    "Progress towards {} pounds goal",
                    format_lbs(self.session.goal())
                ));
                if let Some(warning) = &self.load_warning {
                    ui.colored_label(egui::Color32::YELLOW, warning);
                }
                ui.separator();

                self.draw_progress_section(ui);
                ui.separator();
                self.draw_analytics_section(ui);
                if self.settings.show_history {
                    ui.separator();
                    self.draw_history_section(ui);
                }
                if self.settings.show_daily_summary {
                    ui.separator();
                    self.draw_summary_section(ui);
                }
            });
        });

        self.draw_settings_window(ctx);
        self.draw_toast(ctx);

        if self.settings_dirty {
            self.sync_settings_from_app();
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.sync_settings_from_app();
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let options = NativeOptions::default();
    eframe::run_native(
        "Workout Progress Tracker",
        options,
        Box::new(|_cc| Box::new(TrackerApp::default())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn ts(s: &str) -> Option<NaiveDateTime> {
        Some(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap())
    }

    fn test_app() -> TrackerApp {
        TrackerApp {
            session: SessionState::new(GOAL_WEIGHT_LBS),
            settings: Settings::default(),
            form: EntryForm::default(),
            last_loaded: None,
            load_warning: None,
            submit_error: None,
            toast_message: None,
            toast_start: None,
            sort_column: SortColumn::Date,
            sort_ascending: false,
            show_settings: false,
            settings_dirty: false,
        }
    }

    #[test]
    fn settings_roundtrip() {
        let mut s = Settings::default();
        s.show_remaining_plot = false;
        s.show_area_breakdown = false;
        s.show_weekly_totals = false;
        s.show_history = false;
        s.show_daily_summary = false;
        s.plot_width = 600.0;
        s.plot_height = 300.0;
        s.cell_policy = CellPolicy::DropRow;
        s.auto_load_last = false;
        s.last_file = Some("/tmp/workouts.csv".into());
        s.sort_column = SortColumn::Lifted;
        s.sort_ascending = true;

        let json = serde_json::to_string(&s).unwrap();
        let loaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, loaded);
    }

    #[test]
    fn settings_missing_fields_use_defaults() {
        let json = r#"{
            "show_remaining_plot": true,
            "show_area_breakdown": true,
            "show_weekly_totals": true,
            "show_history": true,
            "show_daily_summary": true,
            "auto_load_last": false,
            "last_file": null,
            "sort_column": "Date",
            "sort_ascending": false
        }"#;
        let loaded: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(loaded.cell_policy, CellPolicy::CoerceToMissing);
        assert_eq!(loaded.plot_width, default_plot_width());
        assert_eq!(loaded.plot_height, default_plot_height());
    }

    #[test]
    fn settings_persistence() {
        use std::env;

        let _guard = ENV_MUTEX.lock().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let prev_config = env::var_os("XDG_CONFIG_HOME");
        unsafe {
            env::set_var("XDG_CONFIG_HOME", dir.path());
        }

        let mut s = Settings::default();
        s.cell_policy = CellPolicy::DropRow;
        s.sort_ascending = true;
        s.save();
        let loaded = Settings::load();
        assert_eq!(loaded.cell_policy, CellPolicy::DropRow);
        assert!(loaded.sort_ascending);

        if let Some(val) = prev_config {
            unsafe {
                env::set_var("XDG_CONFIG_HOME", val);
            }
        } else {
            unsafe {
                env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }

    #[test]
    fn load_csv_bytes_populates_session() {
        let mut app = test_app();
        let data = "Workout Area,Date,Total Lifted,Weight Left\n\
            Bicep,\"March 1, 2024 at 07:00:00 AM\",20,499980\n";
        app.load_csv_bytes("drop.csv", data.as_bytes());
        assert_eq!(app.session.entries().len(), 1);
        assert_eq!(app.last_loaded.as_deref(), Some("drop.csv"));
        assert!(app.load_warning.is_none());
    }

    #[test]
    fn load_csv_bytes_surfaces_row_warnings() {
        let mut app = test_app();
        let data = "Workout Area,Date,Total Lifted,Weight Left\n\
            Cardio,\"March 1, 2024 at 07:00:00 AM\",20,499980\n\
            Bicep,bad date,20,499980\n";
        app.load_csv_bytes("drop.csv", data.as_bytes());
        assert_eq!(app.session.entries().len(), 1);
        let warning = app.load_warning.unwrap();
        assert!(warning.contains("1 rows skipped"));
        assert!(warning.contains("1 unreadable cells"));
    }

    #[test]
    fn missing_file_reports_warning_and_keeps_empty_table() {
        let mut app = test_app();
        app.load_csv_path(std::path::Path::new("/no/such/file.csv"));
        assert!(app.session.entries().is_empty());
        assert!(app.load_warning.unwrap().starts_with("Error loading data:"));
    }

    #[test]
    fn submit_entry_appends_and_resets_form() {
        let mut app = test_app();
        app.session.replace_entries(vec![WorkoutEntry {
            area: WorkoutArea::Chest,
            timestamp: ts("2024-03-01 07:00:00"),
            weight_lifted: Some(20.0),
            weight_remaining: Some(499_980.0),
        }]);
        app.session.add_weight(20.0);
        app.form.area = WorkoutArea::Bicep;
        app.form.time_text = "10:00:00".into();

        app.submit_entry();
        assert!(app.submit_error.is_none());
        assert_eq!(app.session.entries().len(), 2);
        let added = &app.session.entries()[1];
        assert_eq!(added.weight_lifted, Some(20.0));
        assert_eq!(added.weight_remaining, Some(499_960.0));
        assert_eq!(app.session.session_total(), 0.0);
        assert_eq!(app.form.weight_to_add, 0.0);
        assert!(app.toast_message.is_some());
    }

    #[test]
    fn submit_entry_failure_leaves_table_unchanged() {
        let mut app = test_app();
        app.session.add_weight(50.0);
        app.form.time_text = "not a time".into();
        app.submit_entry();
        assert!(app.submit_error.is_some());
        assert!(app.session.entries().is_empty());
        assert_eq!(app.session.session_total(), 50.0);
    }

    #[test]
    fn sorted_entries_newest_first_by_default() {
        let mut app = test_app();
        app.session.replace_entries(vec![
            WorkoutEntry {
                area: WorkoutArea::Chest,
                timestamp: ts("2024-03-01 07:00:00"),
                weight_lifted: Some(20.0),
                weight_remaining: Some(499_980.0),
            },
            WorkoutEntry {
                area: WorkoutArea::Back,
                timestamp: ts("2024-03-02 07:00:00"),
                weight_lifted: Some(30.0),
                weight_remaining: Some(499_950.0),
            },
        ]);
        let rows = app.sorted_entries();
        assert_eq!(rows[0].area, WorkoutArea::Back);
        assert_eq!(rows[1].area, WorkoutArea::Chest);

        app.sort_ascending = true;
        let rows = app.sorted_entries();
        assert_eq!(rows[0].area, WorkoutArea::Chest);
    }

    #[test]
    fn sorted_entries_by_lifted_weight() {
        let mut app = test_app();
        app.session.replace_entries(vec![
            WorkoutEntry {
                area: WorkoutArea::Chest,
                timestamp: ts("2024-03-01 07:00:00"),
                weight_lifted: Some(200.0),
                weight_remaining: Some(499_800.0),
            },
            WorkoutEntry {
                area: WorkoutArea::Back,
                timestamp: ts("2024-03-02 07:00:00"),
                weight_lifted: Some(30.0),
                weight_remaining: Some(499_770.0),
            },
        ]);
        app.sort_column = SortColumn::Lifted;
        app.sort_ascending = true;
        let rows = app.sorted_entries();
        assert_eq!(rows[0].weight_lifted, Some(30.0));
        assert_eq!(rows[1].weight_lifted, Some(200.0));
    }
}
