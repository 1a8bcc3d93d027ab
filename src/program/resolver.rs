//! Resolve which split and which cycle week apply on a given date

use chrono::NaiveDate;
use serde::Serialize;

use super::{Prescription, Program, SplitKey};
use crate::error::{
    InvalidDateError, InvalidWeekError, MissingSplitError, ResolveError, UnknownSplitError,
};

/// Split and 1-indexed cycle week for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleDay {
    pub split_key: SplitKey,
    pub week_number: u32,
}

/// Everything the dashboard shows about today's session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayPlan {
    pub split_key: SplitKey,
    pub split_name: String,
    pub split_description: String,
    pub week_number: u32,
    pub cycle_weeks: u32,
    pub is_deload: bool,
    pub exercises: Vec<Prescription>,
}

/// Weeks elapsed since the cycle started
fn weeks_elapsed(cycle_start: NaiveDate, today: NaiveDate) -> Result<i64, InvalidDateError> {
    let days = (today - cycle_start).num_days();
    if days < 0 {
        return Err(InvalidDateError { today, cycle_start });
    }
    Ok(days / 7)
}

/// Even elapsed weeks run the first declared split, odd weeks the second.
///
/// Pure: identical inputs always give identical output.
pub fn resolve_today(
    program: &Program,
    cycle_start: NaiveDate,
    today: NaiveDate,
) -> Result<CycleDay, ResolveError> {
    let weeks = weeks_elapsed(cycle_start, today)?;
    let week_number = (weeks % i64::from(program.cycle_weeks())) as u32 + 1;

    let split_key = match program.splits() {
        [(first, _), (second, _), ..] => {
            if weeks % 2 == 0 { first } else { second }
        }
        other => return Err(MissingSplitError { found: other.len() }.into()),
    };

    Ok(CycleDay {
        split_key: split_key.clone(),
        week_number,
    })
}

/// Like [`resolve_today`] but a preferred split, when given, replaces the
/// alternation. The week number still comes from the dates.
pub fn resolve_with_override(
    program: &Program,
    cycle_start: NaiveDate,
    today: NaiveDate,
    preferred: Option<&str>,
) -> Result<CycleDay, ResolveError> {
    let mut day = resolve_today(program, cycle_start, today)?;
    if let Some(key) = preferred {
        day.split_key = program
            .split_key(key)
            .cloned()
            .ok_or_else(|| UnknownSplitError { key: key.to_string() })?;
    }
    Ok(day)
}

/// Split and week to file a logged workout under.
///
/// Explicit values are validated on their own; the date is only resolved
/// against the cycle for whatever was left out. A session dated before the
/// cycle start can therefore still be logged with both split and week given.
pub fn log_target(
    program: &Program,
    cycle_start: NaiveDate,
    date: NaiveDate,
    split: Option<&str>,
    week: Option<u32>,
) -> Result<CycleDay, ResolveError> {
    let explicit_split = split
        .map(|key| {
            program
                .split_key(key)
                .cloned()
                .ok_or_else(|| UnknownSplitError { key: key.to_string() })
        })
        .transpose()?;
    if let Some(week) = week
        && (week == 0 || week > program.cycle_weeks())
    {
        return Err(InvalidWeekError { week, cycle_weeks: program.cycle_weeks() }.into());
    }

    match (explicit_split, week) {
        (Some(split_key), Some(week_number)) => Ok(CycleDay { split_key, week_number }),
        (split_key, week_number) => {
            let day = resolve_today(program, cycle_start, date)?;
            Ok(CycleDay {
                split_key: split_key.unwrap_or(day.split_key),
                week_number: week_number.unwrap_or(day.week_number),
            })
        }
    }
}

pub fn today_plan(
    program: &Program,
    cycle_start: NaiveDate,
    today: NaiveDate,
    preferred: Option<&str>,
) -> Result<TodayPlan, ResolveError> {
    let day = resolve_with_override(program, cycle_start, today, preferred)?;
    let split = program.split(&day.split_key).ok_or_else(|| UnknownSplitError {
        key: day.split_key.to_string(),
    })?;

    Ok(TodayPlan {
        split_name: split.name.clone(),
        split_description: split.description.clone(),
        week_number: day.week_number,
        cycle_weeks: program.cycle_weeks(),
        is_deload: program.is_deload(day.week_number),
        exercises: split.prescription(day.week_number).unwrap_or_default(),
        split_key: day.split_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::tests::two_split_program;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_start_day_is_week_one_first_split() {
        let program = two_split_program(4);
        let day = resolve_today(&program, date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        assert_eq!(day.week_number, 1);
        assert_eq!(day.split_key.as_str(), "A");
    }

    #[test]
    fn test_one_week_later_is_week_two_second_split() {
        let program = two_split_program(4);
        let day = resolve_today(&program, date(2024, 1, 1), date(2024, 1, 8)).unwrap();
        assert_eq!(day.week_number, 2);
        assert_eq!(day.split_key.as_str(), "B");
    }

    #[test]
    fn test_last_day_of_first_week() {
        let program = two_split_program(4);
        let day = resolve_today(&program, date(2024, 1, 1), date(2024, 1, 7)).unwrap();
        assert_eq!(day.week_number, 1);
        assert_eq!(day.split_key.as_str(), "A");
    }

    #[test]
    fn test_cycle_wraps_around() {
        let program = two_split_program(4);
        // 4 weeks elapsed: back to week 1, even index -> A
        let day = resolve_today(&program, date(2024, 1, 1), date(2024, 1, 29)).unwrap();
        assert_eq!(day.week_number, 1);
        assert_eq!(day.split_key.as_str(), "A");
    }

    #[test]
    fn test_odd_cycle_length_keeps_week_parity() {
        let program = two_split_program(3);
        // 3 weeks elapsed: week 1 again, but odd elapsed index -> B
        let day = resolve_today(&program, date(2024, 1, 1), date(2024, 1, 22)).unwrap();
        assert_eq!(day.week_number, 1);
        assert_eq!(day.split_key.as_str(), "B");
    }

    #[test]
    fn test_week_number_always_in_range() {
        let program = two_split_program(4);
        let start = date(2024, 1, 1);
        for offset in 0..400 {
            let today = start + chrono::Duration::days(offset);
            let day = resolve_today(&program, start, today).unwrap();
            assert!((1..=4).contains(&day.week_number));
            assert!(program.split(&day.split_key).is_some());
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let program = two_split_program(4);
        let a = resolve_today(&program, date(2024, 3, 4), date(2024, 5, 17)).unwrap();
        let b = resolve_today(&program, date(2024, 3, 4), date(2024, 5, 17)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_today_before_start_is_invalid_date() {
        let program = two_split_program(4);
        let err = resolve_today(&program, date(2024, 1, 8), date(2024, 1, 1)).unwrap_err();
        assert_eq!(
            err,
            ResolveError::InvalidDate(InvalidDateError {
                today: date(2024, 1, 1),
                cycle_start: date(2024, 1, 8),
            })
        );
    }

    #[test]
    fn test_preferred_split_overrides_alternation() {
        let program = two_split_program(4);
        let day =
            resolve_with_override(&program, date(2024, 1, 1), date(2024, 1, 1), Some("B")).unwrap();
        assert_eq!(day.split_key.as_str(), "B");
        assert_eq!(day.week_number, 1);
    }

    #[test]
    fn test_unknown_preferred_split_rejected() {
        let program = two_split_program(4);
        let err = resolve_with_override(&program, date(2024, 1, 1), date(2024, 1, 1), Some("Z"))
            .unwrap_err();
        assert_eq!(err, ResolveError::UnknownSplit(UnknownSplitError { key: "Z".into() }));
    }

    #[test]
    fn test_log_target_before_cycle_start_with_explicit_values() {
        let program = two_split_program(4);
        let day = log_target(&program, date(2024, 1, 10), date(2024, 1, 9), Some("A"), Some(3))
            .unwrap();
        assert_eq!(day.split_key.as_str(), "A");
        assert_eq!(day.week_number, 3);
    }

    #[test]
    fn test_log_target_before_cycle_start_needs_resolver_for_missing_week() {
        let program = two_split_program(4);
        let err = log_target(&program, date(2024, 1, 10), date(2024, 1, 9), Some("A"), None)
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDate(_)));
    }

    #[test]
    fn test_log_target_fills_gaps_from_resolver() {
        let program = two_split_program(4);
        let day = log_target(&program, date(2024, 1, 1), date(2024, 1, 8), None, Some(4)).unwrap();
        assert_eq!(day.split_key.as_str(), "B");
        assert_eq!(day.week_number, 4);

        let day = log_target(&program, date(2024, 1, 1), date(2024, 1, 8), Some("A"), None).unwrap();
        assert_eq!(day.split_key.as_str(), "A");
        assert_eq!(day.week_number, 2);
    }

    #[test]
    fn test_log_target_rejects_bad_explicit_values() {
        let program = two_split_program(4);
        let start = date(2024, 1, 1);
        assert_eq!(
            log_target(&program, start, start, Some("Z"), Some(1)).unwrap_err(),
            ResolveError::UnknownSplit(UnknownSplitError { key: "Z".into() })
        );
        for week in [0, 5] {
            assert_eq!(
                log_target(&program, start, start, Some("A"), Some(week)).unwrap_err(),
                ResolveError::InvalidWeek(InvalidWeekError { week, cycle_weeks: 4 })
            );
        }
    }

    #[test]
    fn test_today_plan_deload_week() {
        let program = two_split_program(4);
        // 3 weeks elapsed -> week 4 (deload), odd -> B
        let plan = today_plan(&program, date(2024, 1, 1), date(2024, 1, 22), None).unwrap();
        assert_eq!(plan.week_number, 4);
        assert!(plan.is_deload);
        assert_eq!(plan.split_name, "Upper");
        assert_eq!(plan.exercises.len(), 1);
        assert_eq!(plan.exercises[0].name, "Bench");
        assert_eq!((plan.exercises[0].sets, plan.exercises[0].reps), (3, 8));
    }
}
