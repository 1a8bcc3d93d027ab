//! Error types for program loading and cycle resolution

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Program file could not be turned into a valid [`crate::program::Program`].
///
/// Always fatal at startup: the process must not run with a broken program.
#[derive(Debug, Error)]
pub enum ProgramLoadError {
    #[error("failed to read program file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed program JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid program: {0}")]
    Invalid(String),

    #[error(transparent)]
    MissingSplit(#[from] MissingSplitError),
}

/// `today` lies before the start of the user's cycle
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("date {today} precedes cycle start {cycle_start}")]
pub struct InvalidDateError {
    pub today: NaiveDate,
    pub cycle_start: NaiveDate,
}

/// Split alternation needs at least two splits
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("program defines {found} split(s), at least 2 are required")]
pub struct MissingSplitError {
    pub found: usize,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown split '{key}'")]
pub struct UnknownSplitError {
    pub key: String,
}

/// Cycle week outside `[1, cycle_weeks]`
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("week {week} is outside the {cycle_weeks}-week cycle")]
pub struct InvalidWeekError {
    pub week: u32,
    pub cycle_weeks: u32,
}

/// Per-request resolver failure, returned to the caller
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    InvalidDate(#[from] InvalidDateError),

    #[error(transparent)]
    MissingSplit(#[from] MissingSplitError),

    #[error(transparent)]
    UnknownSplit(#[from] UnknownSplitError),

    #[error(transparent)]
    InvalidWeek(#[from] InvalidWeekError),
}

/// Malformed `EXERCISE:WEIGHTxREPS[@RPE]` argument
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid set '{input}': {reason}")]
pub struct SetParseError {
    pub input: String,
    pub reason: String,
}
