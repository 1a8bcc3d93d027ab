//! Dashboard data shared by the owner view, the coach view and `stats`

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;

use crate::analytics::{Analytics, ExerciseVolume, WorkoutSummary, workout_summary};
use crate::db::{Database, User, WorkoutLog};
use crate::program::{Program, TodayPlan, today_plan};

/// Who is looking. Coaches never see the share link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Owner,
    Coach,
}

/// Snapshot of one user's training state on a given day
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub viewer: Viewer,
    pub user: User,
    pub today: NaiveDate,
    pub program_name: String,
    /// Resolver failure is shown, not fatal
    pub plan: Result<TodayPlan, String>,
    pub weekly_volume: BTreeMap<String, ExerciseVolume>,
    pub best_e1rm: BTreeMap<String, f64>,
    pub recent_workouts: Vec<WorkoutLog>,
}

impl Dashboard {
    pub fn load(
        db: &Database,
        program: &Program,
        user: User,
        viewer: Viewer,
        today: NaiveDate,
        recent_limit: usize,
    ) -> Result<Self> {
        let sets = db.sets_between(user.id, Analytics::lookback_start(today), today)?;
        let analytics = Analytics::new(sets);
        let plan = today_plan(program, user.cycle_start, today, None).map_err(|e| e.to_string());
        let recent_workouts = db.recent_workouts(user.id, recent_limit)?;

        Ok(Self {
            viewer,
            today,
            program_name: program.name().to_string(),
            plan,
            weekly_volume: analytics.this_week_breakdown(today),
            best_e1rm: analytics.best_one_rep_maxes(today),
            recent_workouts,
            user,
        })
    }

    pub fn title(&self) -> String {
        match self.viewer {
            Viewer::Owner => format!("liftlog - {}", self.user.name),
            Viewer::Coach => format!("liftlog - coach view: {} (read-only)", self.user.name),
        }
    }

    pub fn render_plain(&self) -> String {
        let mut lines = vec![
            self.title(),
            format!("{:-<60}", ""),
            format!("Program: {}", self.program_name),
        ];

        match &self.plan {
            Ok(plan) => {
                let deload = if plan.is_deload { " (deload)" } else { "" };
                lines.push(format!(
                    "Today: split {} - {} | week {}/{}{}",
                    plan.split_key, plan.split_name, plan.week_number, plan.cycle_weeks, deload
                ));
                lines.extend(
                    plan.exercises
                        .iter()
                        .map(|ex| format!("  {:24} {}x{}", ex.name, ex.sets, ex.reps)),
                );
            }
            Err(e) => lines.push(format!("Today: unavailable ({})", e)),
        }

        lines.push(String::new());
        lines.push("Weekly volume:".to_string());
        if self.weekly_volume.is_empty() {
            lines.push("  no sets logged this week".to_string());
        }
        lines.extend(self.weekly_volume.iter().map(|(exercise, v)| {
            format!("  {:24} {:>10.2} | {} sets, {} reps", exercise, v.volume, v.sets, v.reps)
        }));

        lines.push(String::new());
        lines.push("Best estimated 1RM (4 weeks):".to_string());
        if self.best_e1rm.is_empty() {
            lines.push("  no data".to_string());
        }
        lines.extend(
            self.best_e1rm
                .iter()
                .map(|(exercise, e1rm)| format!("  {:24} {:.2}", exercise, e1rm)),
        );

        lines.push(String::new());
        lines.push("Recent workouts:".to_string());
        lines.extend(self.recent_workouts.iter().map(|w| {
            format!(
                "  #{:<4} {} | {} | split {} week {}",
                w.id, w.date, w.workout_name, w.split_key, w.week_number
            )
        }));

        if self.viewer == Viewer::Owner {
            lines.push(String::new());
            lines.push(format!("Coach share token: {}", self.user.share_token));
        }

        lines.join("\n") + "\n"
    }
}

/// One workout with its per-exercise breakdown
#[derive(Debug, Clone)]
pub struct WorkoutDetail {
    pub workout: WorkoutLog,
    pub summary: WorkoutSummary,
}

impl WorkoutDetail {
    /// `None` unless the workout exists and belongs to `user_id`
    pub fn load(db: &Database, user_id: i64, workout_id: i64) -> Result<Option<Self>> {
        let Some(workout) = db.workout(user_id, workout_id)? else {
            return Ok(None);
        };
        let summary = workout_summary(&db.sets_for_workout(workout.id)?);
        Ok(Some(Self { workout, summary }))
    }

    pub fn render_plain(&self) -> String {
        let w = &self.workout;
        let mut lines = vec![format!(
            "{} | {} | split {} week {}",
            w.date, w.workout_name, w.split_key, w.week_number
        )];
        if let Some(notes) = &w.notes {
            lines.push(notes.clone());
        }
        lines.push(format!("{:-<60}", ""));

        for ex in &self.summary.exercises {
            let e1rm = ex.best_e1rm.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".into());
            lines.push(format!("{} (volume {:.2}, best e1RM {})", ex.name, ex.total_volume, e1rm));
            lines.extend(ex.sets.iter().map(|s| {
                let rpe = s.rpe.map(|r| format!(" @{}", r)).unwrap_or_default();
                format!("  set {}: {}x{}{}", s.set_index, s.weight, s.reps, rpe)
            }));
        }
        lines.push(format!("Total volume: {:.2}", self.summary.total_volume));

        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewSet, NewWorkout};
    use crate::program::STARTER_PROGRAM;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> (Database, Program, User) {
        let db = Database::open_in_memory().unwrap();
        let program = Program::from_json(STARTER_PROGRAM).unwrap();
        let user = db.add_user("lifter@gym.io", Some("Lifter"), Some(date(2024, 1, 1))).unwrap();
        let workout = NewWorkout {
            date: date(2024, 1, 9),
            workout_name: "Upper Push + Legs".to_string(),
            week_number: 2,
            split_key: "B".to_string(),
            notes: None,
        };
        let sets = [
            NewSet { exercise_name: "Bench Press".into(), weight: 100.0, reps: 5, rpe: Some(8.0) },
            NewSet { exercise_name: "Bench Press".into(), weight: 100.0, reps: 5, rpe: None },
        ];
        db.add_workout(user.id, &workout, &sets).unwrap();
        (db, program, user)
    }

    #[test]
    fn test_load_owner_dashboard() {
        let (db, program, user) = seeded();
        let dash = Dashboard::load(&db, &program, user, Viewer::Owner, date(2024, 1, 10), 5).unwrap();

        let plan = dash.plan.as_ref().unwrap();
        assert_eq!(plan.split_key.as_str(), "B");
        assert_eq!(plan.week_number, 2);
        assert_eq!(dash.weekly_volume["Bench Press"].volume, 1000.0);
        assert_eq!(dash.weekly_volume["Bench Press"].sets, 2);
        assert_eq!(dash.weekly_volume["Bench Press"].reps, 10);
        assert!((dash.best_e1rm["Bench Press"] - 116.666).abs() < 0.01);
        assert_eq!(dash.recent_workouts.len(), 1);

        let text = dash.render_plain();
        assert!(text.contains("Bench Press"));
        assert!(text.contains(&dash.user.share_token));
        assert!(text.contains("2 sets, 10 reps"));
    }

    #[test]
    fn test_coach_view_hides_share_token() {
        let (db, program, user) = seeded();
        let token = user.share_token.clone();
        let dash = Dashboard::load(&db, &program, user, Viewer::Coach, date(2024, 1, 10), 10).unwrap();
        let text = dash.render_plain();
        assert!(text.contains("read-only"));
        assert!(!text.contains(&token));
    }

    #[test]
    fn test_date_before_cycle_start_shown_not_fatal() {
        let (db, program, user) = seeded();
        let dash = Dashboard::load(&db, &program, user, Viewer::Owner, date(2023, 12, 1), 5).unwrap();
        assert!(dash.plan.is_err());
        assert!(dash.weekly_volume.is_empty());
        assert!(dash.render_plain().contains("unavailable"));
    }

    #[test]
    fn test_workout_detail_for_share_token_owner() {
        let (db, _program, user) = seeded();
        let coach_target = db.user_by_share_token(&user.share_token).unwrap().unwrap();
        let workout_id = db.recent_workouts(user.id, 1).unwrap()[0].id;

        let detail = WorkoutDetail::load(&db, coach_target.id, workout_id).unwrap().unwrap();
        assert_eq!(detail.summary.exercises.len(), 1);
        assert_eq!(detail.summary.total_volume, 1000.0);

        let text = detail.render_plain();
        assert!(text.contains("Bench Press (volume 1000.00"));
        assert!(text.contains("set 2: 100x5"));
    }

    #[test]
    fn test_workout_detail_rejects_other_users_workout() {
        let (db, _program, user) = seeded();
        let other = db.add_user("coachee@gym.io", None, Some(date(2024, 1, 1))).unwrap();
        let foreign_id = db.recent_workouts(user.id, 1).unwrap()[0].id;

        // Token of `other` must not open a workout owned by `user`
        let scoped = db.user_by_share_token(&other.share_token).unwrap().unwrap();
        assert!(WorkoutDetail::load(&db, scoped.id, foreign_id).unwrap().is_none());
        assert!(WorkoutDetail::load(&db, scoped.id, 9999).unwrap().is_none());
    }
}
