//! In-memory session state: the entry table plus the form accumulator.

use crate::WorkoutEntry;
use crate::categories::WorkoutArea;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Fixed cumulative goal defining 0% and 100% progress.
pub const GOAL_WEIGHT_LBS: f64 = 500_000.0;

/// Failures while committing a new entry. The table is never modified when
/// one of these is returned.
#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("Invalid time format: {0:?} (expected HH:MM or HH:MM:SS)")]
    InvalidTime(String),

    #[error("Session total is not a finite number")]
    NotFinite,
}

/// State for one interactive session: the current table and the running
/// "weight added this session" accumulator.
///
/// There is exactly one writer and one reader, both on the UI thread, so the
/// state is plain owned data on the app struct.
#[derive(Debug)]
pub struct SessionState {
    entries: Vec<WorkoutEntry>,
    session_total: f64,
    goal: f64,
}

impl SessionState {
    pub fn new(goal: f64) -> Self {
        Self {
            entries: Vec::new(),
            session_total: 0.0,
            goal,
        }
    }

    pub fn entries(&self) -> &[WorkoutEntry] {
        &self.entries
    }

    /// Swap in a freshly loaded table. The accumulator is untouched so an
    /// in-progress form interaction survives a reload.
    pub fn replace_entries(&mut self, entries: Vec<WorkoutEntry>) {
        self.entries = entries;
    }

    pub fn goal(&self) -> f64 {
        self.goal
    }

    pub fn session_total(&self) -> f64 {
        self.session_total
    }

    /// Add one user-entered increment to the session accumulator.
    /// Non-positive and non-finite increments are ignored.
    pub fn add_weight(&mut self, lbs: f64) {
        if lbs.is_finite() && lbs > 0.0 {
            self.session_total += lbs;
        }
    }

    pub fn reset_session_total(&mut self) {
        self.session_total = 0.0;
    }

    /// Weight still to lift: the last recorded `Weight Left`, or the goal when
    /// the table is empty. Entries with a missing value are skipped.
    pub fn current_remaining(&self) -> f64 {
        self.entries
            .iter()
            .rev()
            .find_map(|e| e.weight_remaining)
            .unwrap_or(self.goal)
    }

    /// Commit the accumulated session total as a new entry.
    ///
    /// The date and the textual time are combined into one timestamp and the
    /// new `weight_remaining` is the previous remaining minus the accumulator.
    /// On success the accumulator resets to zero and the committed entry is
    /// returned; on failure the table and accumulator are left as they were.
    pub fn commit(
        &mut self,
        area: WorkoutArea,
        date: NaiveDate,
        time_text: &str,
    ) -> Result<WorkoutEntry, SubmitError> {
        let time = parse_time(time_text)
            .ok_or_else(|| SubmitError::InvalidTime(time_text.to_string()))?;
        if !self.session_total.is_finite() {
            return Err(SubmitError::NotFinite);
        }

        let entry = WorkoutEntry {
            area,
            timestamp: Some(NaiveDateTime::new(date, time)),
            weight_lifted: Some(self.session_total),
            weight_remaining: Some(self.current_remaining() - self.session_total),
        };
        self.entries.push(entry.clone());
        self.session_total = 0.0;
        Ok(entry)
    }
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    #[test]
    fn commit_subtracts_from_previous_remaining() {
        let mut state = SessionState::new(GOAL_WEIGHT_LBS);
        state.replace_entries(vec![WorkoutEntry {
            area: WorkoutArea::Chest,
            timestamp: None,
            weight_lifted: Some(20.0),
            weight_remaining: Some(499_980.0),
        }]);
        state.add_weight(20.0);

        let entry = state
            .commit(WorkoutArea::Bicep, sample_date(), "10:30:00")
            .unwrap();
        assert_eq!(entry.area, WorkoutArea::Bicep);
        assert_eq!(entry.weight_lifted, Some(20.0));
        assert_eq!(entry.weight_remaining, Some(499_960.0));
        assert_eq!(state.session_total(), 0.0);
        assert_eq!(state.entries().len(), 2);
    }

    #[test]
    fn commit_on_empty_table_starts_from_goal() {
        let mut state = SessionState::new(GOAL_WEIGHT_LBS);
        state.add_weight(100.0);
        let entry = state
            .commit(WorkoutArea::Back, sample_date(), "08:00")
            .unwrap();
        assert_eq!(entry.weight_remaining, Some(499_900.0));
    }

    #[test]
    fn remaining_round_trip_is_exact() {
        let mut state = SessionState::new(GOAL_WEIGHT_LBS);
        let before = state.current_remaining();
        state.add_weight(12.5);
        state.add_weight(7.5);
        state
            .commit(WorkoutArea::Calf, sample_date(), "07:15:30")
            .unwrap();
        assert_eq!(state.current_remaining(), before - 20.0);
    }

    #[test]
    fn bad_time_leaves_state_unmodified() {
        let mut state = SessionState::new(GOAL_WEIGHT_LBS);
        state.add_weight(50.0);
        let err = state
            .commit(WorkoutArea::Tricep, sample_date(), "later")
            .unwrap_err();
        assert_eq!(err, SubmitError::InvalidTime("later".into()));
        assert!(state.entries().is_empty());
        assert_eq!(state.session_total(), 50.0);
    }

    #[test]
    fn add_weight_ignores_invalid_increments() {
        let mut state = SessionState::new(GOAL_WEIGHT_LBS);
        state.add_weight(-5.0);
        state.add_weight(f64::NAN);
        state.add_weight(0.0);
        assert_eq!(state.session_total(), 0.0);
    }

    #[test]
    fn current_remaining_skips_missing_values() {
        let mut state = SessionState::new(GOAL_WEIGHT_LBS);
        state.replace_entries(vec![
            WorkoutEntry {
                area: WorkoutArea::Chest,
                timestamp: None,
                weight_lifted: Some(100.0),
                weight_remaining: Some(499_900.0),
            },
            WorkoutEntry {
                area: WorkoutArea::Back,
                timestamp: None,
                weight_lifted: Some(50.0),
                weight_remaining: None,
            },
        ]);
        assert_eq!(state.current_remaining(), 499_900.0);
    }
}
