use phf::phf_map;
use serde::{Deserialize, Serialize};

/// Fixed set of body areas a workout can target.
///
/// The CSV column `Workout Area` must hold one of these labels; rows with any
/// other value are rejected by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkoutArea {
    Shoulder,
    Bicep,
    Chest,
    Tricep,
    UpperLeg,
    Calf,
    Back,
}

pub const ALL_AREAS: [WorkoutArea; 7] = [
    WorkoutArea::Shoulder,
    WorkoutArea::Bicep,
    WorkoutArea::Chest,
    WorkoutArea::Tricep,
    WorkoutArea::UpperLeg,
    WorkoutArea::Calf,
    WorkoutArea::Back,
];

static AREA_NAMES: phf::Map<&'static str, WorkoutArea> = phf_map! {
    "Shoulder" => WorkoutArea::Shoulder,
    "Bicep" => WorkoutArea::Bicep,
    "Chest" => WorkoutArea::Chest,
    "Tricep" => WorkoutArea::Tricep,
    "Upper leg" => WorkoutArea::UpperLeg,
    "Calf" => WorkoutArea::Calf,
    "Back" => WorkoutArea::Back,
};

impl WorkoutArea {
    /// Canonical label as it appears in the CSV and the UI.
    pub fn label(self) -> &'static str {
        match self {
            WorkoutArea::Shoulder => "Shoulder",
            WorkoutArea::Bicep => "Bicep",
            WorkoutArea::Chest => "Chest",
            WorkoutArea::Tricep => "Tricep",
            WorkoutArea::UpperLeg => "Upper leg",
            WorkoutArea::Calf => "Calf",
            WorkoutArea::Back => "Back",
        }
    }
}

impl std::fmt::Display for WorkoutArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Look up the area for a CSV cell value.
///
/// Exact labels hit the static table; anything else falls back to a
/// case-insensitive scan so "upper leg" and "BACK" still resolve.
pub fn area_for(name: &str) -> Option<WorkoutArea> {
    let name = name.trim();
    if let Some(area) = AREA_NAMES.get(name) {
        return Some(*area);
    }
    ALL_AREAS
        .into_iter()
        .find(|a| a.label().eq_ignore_ascii_case(name))
}

/// Best-guess area for an unrecognized name, used in load warnings.
///
/// Returns `None` when nothing is similar enough to suggest.
pub fn closest_area(name: &str) -> Option<WorkoutArea> {
    let name = name.trim().to_lowercase();
    ALL_AREAS
        .into_iter()
        .map(|a| (strsim::normalized_levenshtein(&name, &a.label().to_lowercase()), a))
        .filter(|(score, _)| *score >= 0.6)
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, a)| a)
}
