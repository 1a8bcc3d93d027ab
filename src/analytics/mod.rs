//! Analytics module - weekly volume and estimated one-rep max
//!
//! Everything here is a pure function of the sets passed in. Exercises with no
//! qualifying sets are left out of the result maps, so a missing key means
//! "no data" and never "zero".

pub mod summary;

pub use summary::{ExerciseSummary, WorkoutSummary, workout_summary};

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::db::LoggedSet;

/// Trailing window for best e1RM, in weeks
pub const DEFAULT_WINDOW_WEEKS: u32 = 4;

/// Epley estimate `weight * (1 + reps / 30)`. A zero-rep set is not a lift.
pub fn epley(weight: f64, reps: u32) -> Option<f64> {
    if reps == 0 {
        return None;
    }
    Some(weight * (1.0 + f64::from(reps) / 30.0))
}

/// Monday of the week containing `today` and the following Monday
///
/// Saturates at the ends of the calendar instead of overflowing.
pub fn current_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let back = Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let start = today.checked_sub_signed(back).unwrap_or(NaiveDate::MIN);
    let end = start.checked_add_signed(Duration::days(7)).unwrap_or(NaiveDate::MAX);
    (start, end)
}

/// First day of a trailing window of `weeks` weeks ending at `as_of`
fn window_start(as_of: NaiveDate, weeks: u32) -> NaiveDate {
    Duration::try_weeks(i64::from(weeks))
        .and_then(|span| as_of.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}

/// Volume, set count and rep count for one exercise
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExerciseVolume {
    pub volume: f64,
    pub sets: u32,
    pub reps: u32,
}

/// Like [`weekly_volume`] but also counts sets and reps per exercise
pub fn weekly_breakdown(
    sets: &[LoggedSet],
    week_start: NaiveDate,
    week_end: NaiveDate,
) -> BTreeMap<String, ExerciseVolume> {
    let mut breakdown: BTreeMap<String, ExerciseVolume> = BTreeMap::new();
    for set in sets
        .iter()
        .filter(|s| s.reps > 0 && s.date >= week_start && s.date < week_end)
    {
        let entry = breakdown.entry(set.exercise_name.clone()).or_default();
        entry.volume += set.weight * f64::from(set.reps);
        entry.sets += 1;
        entry.reps = entry.reps.saturating_add(set.reps);
    }
    breakdown
}

/// Sum of `weight * reps` per exercise for sets dated in `[week_start, week_end)`
pub fn weekly_volume(
    sets: &[LoggedSet],
    week_start: NaiveDate,
    week_end: NaiveDate,
) -> BTreeMap<String, f64> {
    let mut volumes = BTreeMap::new();
    for set in sets
        .iter()
        .filter(|s| s.reps > 0 && s.date >= week_start && s.date < week_end)
    {
        *volumes.entry(set.exercise_name.clone()).or_insert(0.0) += set.weight * f64::from(set.reps);
    }
    volumes
}

/// Best Epley e1RM per exercise over `[as_of - window_weeks * 7 days, as_of]`
pub fn estimated_one_rep_max(
    sets: &[LoggedSet],
    as_of: NaiveDate,
    window_weeks: u32,
) -> BTreeMap<String, f64> {
    let from = window_start(as_of, window_weeks);
    let mut best: BTreeMap<String, f64> = BTreeMap::new();

    for set in sets.iter().filter(|s| s.date >= from && s.date <= as_of) {
        let Some(e1rm) = epley(set.weight, set.reps) else {
            continue;
        };
        best.entry(set.exercise_name.clone())
            .and_modify(|current| *current = current.max(e1rm))
            .or_insert(e1rm);
    }

    best
}

/// Training analytics over one user's sets
pub struct Analytics {
    sets: Vec<LoggedSet>,
}

impl Analytics {
    pub fn new(sets: Vec<LoggedSet>) -> Self {
        Self { sets }
    }

    /// Earliest date whose sets can affect [`Self::this_week_volume`] or
    /// [`Self::best_one_rep_maxes`] for `today`
    pub fn lookback_start(today: NaiveDate) -> NaiveDate {
        let (week_start, _) = current_week(today);
        week_start.min(window_start(today, DEFAULT_WINDOW_WEEKS))
    }

    /// Volume per exercise for the calendar week containing `today`
    pub fn this_week_volume(&self, today: NaiveDate) -> BTreeMap<String, f64> {
        let (start, end) = current_week(today);
        weekly_volume(&self.sets, start, end)
    }

    /// Volume with set and rep counts for the week containing `today`
    pub fn this_week_breakdown(&self, today: NaiveDate) -> BTreeMap<String, ExerciseVolume> {
        let (start, end) = current_week(today);
        weekly_breakdown(&self.sets, start, end)
    }

    /// Best e1RM per exercise over the default trailing window
    pub fn best_one_rep_maxes(&self, today: NaiveDate) -> BTreeMap<String, f64> {
        estimated_one_rep_max(&self.sets, today, DEFAULT_WINDOW_WEEKS)
    }

    /// Total volume across all exercises this week
    pub fn total_week_volume(&self, today: NaiveDate) -> f64 {
        self.this_week_volume(today).values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn logged(exercise: &str, weight: f64, reps: u32, day: NaiveDate) -> LoggedSet {
        LoggedSet {
            date: day,
            exercise_name: exercise.to_string(),
            weight,
            reps,
            rpe: None,
        }
    }

    #[test]
    fn test_empty_input_gives_empty_maps() {
        let today = date(2024, 1, 10);
        assert!(weekly_volume(&[], date(2024, 1, 8), date(2024, 1, 15)).is_empty());
        assert!(estimated_one_rep_max(&[], today, DEFAULT_WINDOW_WEEKS).is_empty());
    }

    #[test]
    fn test_weekly_volume_sums_per_exercise() {
        let day = date(2024, 1, 9);
        let sets = vec![logged("Bench", 100.0, 5, day), logged("Bench", 100.0, 5, day)];
        let volume = weekly_volume(&sets, date(2024, 1, 8), date(2024, 1, 15));
        assert_eq!(volume.len(), 1);
        assert_eq!(volume["Bench"], 1000.0);
    }

    #[test]
    fn test_weekly_volume_half_open_range() {
        let sets = vec![
            logged("Squat", 100.0, 5, date(2024, 1, 7)),  // before
            logged("Squat", 100.0, 3, date(2024, 1, 8)),  // start, included
            logged("Squat", 100.0, 2, date(2024, 1, 14)), // last day, included
            logged("Squat", 100.0, 9, date(2024, 1, 15)), // end, excluded
        ];
        let volume = weekly_volume(&sets, date(2024, 1, 8), date(2024, 1, 15));
        assert_eq!(volume["Squat"], 500.0);
    }

    #[test]
    fn test_weekly_volume_omits_inactive_exercises() {
        let sets = vec![
            logged("Squat", 100.0, 5, date(2024, 1, 9)),
            logged("Deadlift", 180.0, 5, date(2024, 1, 2)),
        ];
        let volume = weekly_volume(&sets, date(2024, 1, 8), date(2024, 1, 15));
        assert!(volume.contains_key("Squat"));
        assert!(!volume.contains_key("Deadlift"));
    }

    #[test]
    fn test_weekly_volume_keeps_logged_zero_weight() {
        let sets = vec![logged("Dip", 0.0, 12, date(2024, 1, 9))];
        let volume = weekly_volume(&sets, date(2024, 1, 8), date(2024, 1, 15));
        assert_eq!(volume.get("Dip"), Some(&0.0));
    }

    #[test]
    fn test_e1rm_single_set() {
        let today = date(2024, 1, 20);
        let sets = vec![logged("Squat", 200.0, 5, date(2024, 1, 15))];
        let e1rm = estimated_one_rep_max(&sets, today, DEFAULT_WINDOW_WEEKS);
        assert!((e1rm["Squat"] - 233.333).abs() < 0.01, "got {}", e1rm["Squat"]);
    }

    #[test]
    fn test_e1rm_keeps_best_set() {
        let day = date(2024, 1, 15);
        let sets = vec![
            logged("Bench", 100.0, 5, day), // 116.67
            logged("Bench", 90.0, 10, day), // 120.0
            logged("Bench", 110.0, 1, day), // 113.67
        ];
        let e1rm = estimated_one_rep_max(&sets, date(2024, 1, 15), DEFAULT_WINDOW_WEEKS);
        assert!((e1rm["Bench"] - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_e1rm_window_bounds_inclusive() {
        let as_of = date(2024, 2, 1);
        let sets = vec![
            logged("Row", 100.0, 5, date(2024, 1, 4)),  // exactly 28 days back
            logged("Curl", 40.0, 10, date(2024, 1, 3)), // 29 days back, outside
            logged("Press", 60.0, 5, as_of),
            logged("Squat", 150.0, 5, date(2024, 2, 2)), // future, outside
        ];
        let e1rm = estimated_one_rep_max(&sets, as_of, 4);
        assert!(e1rm.contains_key("Row"));
        assert!(e1rm.contains_key("Press"));
        assert!(!e1rm.contains_key("Curl"));
        assert!(!e1rm.contains_key("Squat"));
    }

    #[test]
    fn test_zero_reps_never_contribute() {
        let day = date(2024, 1, 9);
        let sets = vec![logged("Squat", 200.0, 0, day)];
        assert!(weekly_volume(&sets, date(2024, 1, 8), date(2024, 1, 15)).is_empty());
        assert!(estimated_one_rep_max(&sets, day, DEFAULT_WINDOW_WEEKS).is_empty());
    }

    #[test]
    fn test_zero_reps_do_not_lower_best() {
        let day = date(2024, 1, 9);
        let sets = vec![logged("Squat", 100.0, 3, day), logged("Squat", 300.0, 0, day)];
        let e1rm = estimated_one_rep_max(&sets, day, DEFAULT_WINDOW_WEEKS);
        assert!((e1rm["Squat"] - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_huge_window_on_empty_input() {
        let today = date(2024, 1, 10);
        assert!(estimated_one_rep_max(&[], today, u32::MAX).is_empty());
    }

    #[test]
    fn test_huge_window_covers_all_history() {
        let sets = vec![logged("Squat", 100.0, 5, date(1990, 6, 1))];
        let e1rm = estimated_one_rep_max(&sets, date(2024, 1, 10), u32::MAX);
        assert!(e1rm.contains_key("Squat"));
    }

    #[test]
    fn test_current_week_at_calendar_edges() {
        let (start, end) = current_week(NaiveDate::MAX);
        assert!(start <= NaiveDate::MAX);
        assert_eq!(end, NaiveDate::MAX);

        let (start, end) = current_week(NaiveDate::MIN);
        assert_eq!(start, NaiveDate::MIN);
        assert!(end > NaiveDate::MIN);
    }

    #[test]
    fn test_weekly_breakdown_counts_sets_and_reps() {
        let day = date(2024, 1, 9);
        let sets = vec![
            logged("Bench", 100.0, 5, day),
            logged("Bench", 100.0, 3, day),
            logged("Bench", 120.0, 0, day),
            logged("Row", 80.0, 10, date(2024, 1, 2)),
        ];
        let breakdown = weekly_breakdown(&sets, date(2024, 1, 8), date(2024, 1, 15));
        assert_eq!(breakdown.len(), 1);
        assert_eq!(
            breakdown["Bench"],
            ExerciseVolume { volume: 800.0, sets: 2, reps: 8 }
        );
    }

    #[test]
    fn test_epley() {
        assert_eq!(epley(100.0, 0), None);
        assert_eq!(epley(150.0, 30), Some(300.0));
    }

    #[test]
    fn test_current_week_monday_to_monday() {
        // 2024-01-10 is a Wednesday
        assert_eq!(current_week(date(2024, 1, 10)), (date(2024, 1, 8), date(2024, 1, 15)));
        assert_eq!(current_week(date(2024, 1, 8)), (date(2024, 1, 8), date(2024, 1, 15)));
        assert_eq!(current_week(date(2024, 1, 14)), (date(2024, 1, 8), date(2024, 1, 15)));
    }

    #[test]
    fn test_analytics_this_week() {
        let today = date(2024, 1, 10);
        let analytics = Analytics::new(vec![
            logged("Bench", 100.0, 5, date(2024, 1, 8)),
            logged("Squat", 120.0, 5, date(2024, 1, 10)),
            logged("Squat", 120.0, 5, date(2024, 1, 5)),
        ]);
        let volume = analytics.this_week_volume(today);
        assert_eq!(volume["Bench"], 500.0);
        assert_eq!(volume["Squat"], 600.0);
        assert_eq!(analytics.total_week_volume(today), 1100.0);
        assert_eq!(analytics.best_one_rep_maxes(today).len(), 2);
    }

    #[test]
    fn test_lookback_covers_week_and_window() {
        let today = date(2024, 1, 10);
        assert_eq!(Analytics::lookback_start(today), date(2023, 12, 13));
    }
}
