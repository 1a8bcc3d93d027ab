//! Per-workout breakdown for the history and coach views

use serde::Serialize;

use super::epley;
use crate::db::SetLog;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseSummary {
    pub name: String,
    pub sets: Vec<SetLog>,
    pub total_volume: f64,
    /// `None` when every set had zero reps
    pub best_e1rm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSummary {
    pub total_volume: f64,
    pub exercises: Vec<ExerciseSummary>,
}

/// Group a workout's sets by exercise, in order of first appearance
pub fn workout_summary(sets: &[SetLog]) -> WorkoutSummary {
    let mut exercises: Vec<ExerciseSummary> = Vec::new();

    for set in sets {
        let idx = match exercises.iter().position(|e| e.name == set.exercise_name) {
            Some(idx) => idx,
            None => {
                exercises.push(ExerciseSummary {
                    name: set.exercise_name.clone(),
                    sets: Vec::new(),
                    total_volume: 0.0,
                    best_e1rm: None,
                });
                exercises.len() - 1
            }
        };

        let summary = &mut exercises[idx];
        summary.sets.push(set.clone());
        summary.total_volume += set.weight * f64::from(set.reps);
        if let Some(e1rm) = epley(set.weight, set.reps) {
            summary.best_e1rm = Some(summary.best_e1rm.map_or(e1rm, |best| best.max(e1rm)));
        }
    }

    WorkoutSummary {
        total_volume: exercises.iter().map(|e| e.total_volume).sum(),
        exercises,
    }
}
