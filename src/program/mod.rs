//! Periodized program definition - loaded once from JSON, immutable afterwards
//!
//! A program is a cycle of `cycle_weeks` weeks. Every exercise carries one
//! set count and one rep count per week of the cycle; index `i` is the
//! prescription for week `i + 1`.

pub mod resolver;

pub use resolver::{
    CycleDay, TodayPlan, log_target, resolve_today, resolve_with_override, today_plan,
};

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MissingSplitError, ProgramLoadError};

/// Starter 3+1 program written by `liftlog program init`
pub const STARTER_PROGRAM: &str = include_str!("starter.json");

/// Split identifier validated against the program at load time
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SplitKey(String);

impl SplitKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SplitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exercise as defined by the program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Exercise {
    pub name: String,
    pub sets: Vec<u32>,
    pub reps: Vec<u32>,
    #[serde(default)]
    pub notes: String,
}

impl Exercise {
    /// Prescription for a 1-indexed cycle week
    pub fn for_week(&self, week_number: u32) -> Option<Prescription> {
        let index = usize::try_from(week_number.checked_sub(1)?).ok()?;
        Some(Prescription {
            name: self.name.clone(),
            sets: *self.sets.get(index)?,
            reps: *self.reps.get(index)?,
            notes: self.notes.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Split {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub exercises: Vec<Exercise>,
}

impl Split {
    pub fn prescription(&self, week_number: u32) -> Option<Vec<Prescription>> {
        self.exercises.iter().map(|e| e.for_week(week_number)).collect()
    }
}

/// Concrete target for one exercise in one week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prescription {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    pub notes: String,
}

/// On-disk shape. `splits` stays a JSON map so declaration order survives.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProgram {
    name: String,
    #[serde(default)]
    description: String,
    cycle_weeks: u32,
    splits: serde_json::Map<String, serde_json::Value>,
}

/// Validated program
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    name: String,
    description: String,
    cycle_weeks: u32,
    splits: Vec<(SplitKey, Split)>,
}

impl Program {
    /// Load and validate the program file. Any failure is fatal for startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProgramLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ProgramLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let program = Self::parse(&text, path)?;
        info!(
            "Loaded program '{}' from {} ({} weeks, {} splits)",
            program.name,
            path.display(),
            program.cycle_weeks,
            program.splits.len()
        );
        Ok(program)
    }

    pub fn from_json(json: &str) -> Result<Self, ProgramLoadError> {
        Self::parse(json, Path::new("<inline>"))
    }

    fn parse(json: &str, path: &Path) -> Result<Self, ProgramLoadError> {
        let parse_err = |source| ProgramLoadError::Parse {
            path: path.to_path_buf(),
            source,
        };

        let raw: RawProgram = serde_json::from_str(json).map_err(parse_err)?;
        let mut splits = Vec::with_capacity(raw.splits.len());
        for (key, value) in raw.splits {
            let split: Split = serde_json::from_value(value).map_err(parse_err)?;
            splits.push((key, split));
        }

        Self::new(raw.name, raw.description, raw.cycle_weeks, splits)
    }

    /// Build a program, checking every invariant the resolver relies on
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        cycle_weeks: u32,
        splits: Vec<(String, Split)>,
    ) -> Result<Self, ProgramLoadError> {
        if cycle_weeks == 0 {
            return Err(ProgramLoadError::Invalid("cycle_weeks must be at least 1".into()));
        }

        let expected = cycle_weeks as usize;
        let mut validated: Vec<(SplitKey, Split)> = Vec::with_capacity(splits.len());
        for (key, split) in splits {
            let key = key.trim();
            if key.is_empty() {
                return Err(ProgramLoadError::Invalid("split key must not be empty".into()));
            }
            if validated.iter().any(|(k, _)| k.as_str() == key) {
                return Err(ProgramLoadError::Invalid(format!("duplicate split key '{key}'")));
            }
            if split.exercises.is_empty() {
                return Err(ProgramLoadError::Invalid(format!("split '{key}' has no exercises")));
            }
            for exercise in &split.exercises {
                if exercise.sets.len() != expected || exercise.reps.len() != expected {
                    return Err(ProgramLoadError::Invalid(format!(
                        "exercise '{}' in split '{key}' needs {expected} sets and reps entries, found {} and {}",
                        exercise.name,
                        exercise.sets.len(),
                        exercise.reps.len()
                    )));
                }
            }
            debug!("Split {key}: {} ({} exercises)", split.name, split.exercises.len());
            validated.push((SplitKey(key.to_string()), split));
        }

        if validated.len() < 2 {
            return Err(MissingSplitError { found: validated.len() }.into());
        }

        Ok(Self {
            name: name.into(),
            description: description.into(),
            cycle_weeks,
            splits: validated,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cycle_weeks(&self) -> u32 {
        self.cycle_weeks
    }

    /// Splits in declaration order
    pub fn splits(&self) -> &[(SplitKey, Split)] {
        &self.splits
    }

    /// Look up a user-supplied key. Unknown keys are rejected here, not later.
    pub fn split_key(&self, key: &str) -> Option<&SplitKey> {
        let key = key.trim();
        self.splits
            .iter()
            .map(|(k, _)| k)
            .find(|k| k.as_str() == key)
    }

    pub fn split(&self, key: &SplitKey) -> Option<&Split> {
        self.splits.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    /// Exercises of a split for a 1-indexed week, `None` outside the cycle
    pub fn prescription(&self, key: &SplitKey, week_number: u32) -> Option<Vec<Prescription>> {
        if week_number == 0 || week_number > self.cycle_weeks {
            return None;
        }
        self.split(key)?.prescription(week_number)
    }

    /// Last week of the cycle is the deload week
    pub fn is_deload(&self, week_number: u32) -> bool {
        week_number == self.cycle_weeks
    }
}
