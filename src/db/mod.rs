//! Database module - SQLite storage for users, workouts and sets

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use rand::{Rng, distributions::Alphanumeric};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SetParseError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of the coach view share token
pub const SHARE_TOKEN_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub cycle_start: NaiveDate,
    pub share_token: String,
    pub created_at: DateTime<Utc>,
}

/// One logged session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutLog {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub workout_name: String,
    pub week_number: u32,
    pub split_key: String,
    pub notes: Option<String>,
}

/// One performed set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLog {
    pub id: i64,
    pub workout_log_id: i64,
    pub exercise_name: String,
    pub set_index: u32,
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<f64>,  // 1-10, stored as logged
}

/// Set joined with its workout date - the analytics input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedSet {
    pub date: NaiveDate,
    pub exercise_name: String,
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub date: NaiveDate,
    pub workout_name: String,
    pub week_number: u32,
    pub split_key: String,
    pub notes: Option<String>,
}

/// Set to be logged, parsed from `EXERCISE:WEIGHTxREPS[@RPE]`
#[derive(Debug, Clone, PartialEq)]
pub struct NewSet {
    pub exercise_name: String,
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<f64>,
}

impl FromStr for NewSet {
    type Err = SetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |reason: &str| SetParseError {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (name, load) = s.rsplit_once(':').ok_or_else(|| bad("missing ':' after exercise name"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(bad("empty exercise name"));
        }

        let (load, rpe) = match load.split_once('@') {
            Some((load, rpe)) => (load, Some(rpe.trim())),
            None => (load, None),
        };
        let (weight, reps) = load
            .split_once(['x', 'X'])
            .ok_or_else(|| bad("expected WEIGHTxREPS"))?;

        let weight: f64 = weight.trim().parse().map_err(|_| bad("weight is not a number"))?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(bad("weight must be a non-negative number"));
        }
        let reps: u32 = reps.trim().parse().map_err(|_| bad("reps must be a whole number"))?;
        let rpe = match rpe {
            Some(rpe) => {
                let rpe: f64 = rpe.parse().map_err(|_| bad("RPE is not a number"))?;
                if !(0.0..=10.0).contains(&rpe) {
                    return Err(bad("RPE must be between 0 and 10"));
                }
                Some(rpe)
            }
            None => None,
        };

        Ok(Self {
            exercise_name: name.to_string(),
            weight,
            reps,
            rpe,
        })
    }
}

fn generate_share_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHARE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// "jane.doe@x.com" -> "Jane.doe"
fn default_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let mut chars = local.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parse_date(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    let cycle_start: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        cycle_start: parse_date(3, &cycle_start)?,
        share_token: row.get(4)?,
        created_at: parse_timestamp(5, &created_at)?,
    })
}

fn workout_from_row(row: &Row) -> rusqlite::Result<WorkoutLog> {
    let date: String = row.get(2)?;
    Ok(WorkoutLog {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_date(2, &date)?,
        workout_name: row.get(3)?,
        week_number: row.get(4)?,
        split_key: row.get(5)?,
        notes: row.get(6)?,
    })
}

const USER_COLUMNS: &str = "id, email, name, cycle_start, share_token, created_at";
const WORKOUT_COLUMNS: &str = "id, user_id, date, workout_name, week_number, split_key, notes";

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("opening database {}", path))?;
        info!("Opened database {}", path);
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                cycle_start TEXT NOT NULL,
                share_token TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS workout_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                workout_name TEXT NOT NULL,
                week_number INTEGER NOT NULL,
                split_key TEXT NOT NULL,
                notes TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_workout_logs_user_date ON workout_logs(user_id, date);

            CREATE TABLE IF NOT EXISTS set_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workout_log_id INTEGER NOT NULL REFERENCES workout_logs(id) ON DELETE CASCADE,
                exercise_name TEXT NOT NULL,
                set_index INTEGER NOT NULL,
                weight REAL NOT NULL,
                reps INTEGER NOT NULL,
                rpe REAL
            );
            CREATE INDEX IF NOT EXISTS idx_set_logs_workout ON set_logs(workout_log_id);",
        )?;
        Ok(())
    }

    /// Register a user. Email is normalized, name defaults to the email prefix
    /// and the cycle starts on the registration day unless given.
    pub fn add_user(
        &self,
        email: &str,
        name: Option<&str>,
        cycle_start: Option<NaiveDate>,
    ) -> Result<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            anyhow::bail!("email must not be empty");
        }
        if self.user_by_email(&email)?.is_some() {
            anyhow::bail!("a user with email {} already exists", email);
        }

        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => default_name(&email),
        };
        let created_at = Utc::now();
        let cycle_start = cycle_start.unwrap_or_else(|| Local::now().date_naive());
        let share_token = generate_share_token();

        self.conn.execute(
            "INSERT INTO users (email, name, cycle_start, share_token, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                email,
                name,
                cycle_start.format(DATE_FORMAT).to_string(),
                share_token,
                created_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("Registered user {} (id: {})", email, id);

        Ok(User {
            id,
            email,
            name,
            cycle_start,
            share_token,
            created_at,
        })
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email.trim().to_lowercase()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Resolve a coach view token
    pub fn user_by_share_token(&self, token: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE share_token = ?1"),
                params![token.trim()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY email"))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Store a workout and its sets atomically. Set indexes are 1-based and
    /// counted per exercise in the order given.
    pub fn add_workout(&self, user_id: i64, workout: &NewWorkout, sets: &[NewSet]) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO workout_logs (user_id, date, workout_name, week_number, split_key, notes) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                workout.date.format(DATE_FORMAT).to_string(),
                workout.workout_name,
                workout.week_number,
                workout.split_key,
                workout.notes,
            ],
        )?;
        let workout_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO set_logs (workout_log_id, exercise_name, set_index, weight, reps, rpe) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (i, set) in sets.iter().enumerate() {
                let set_index = sets[..i]
                    .iter()
                    .filter(|s| s.exercise_name == set.exercise_name)
                    .count()
                    + 1;
                stmt.execute(params![
                    workout_id,
                    set.exercise_name,
                    set_index as u32,
                    set.weight,
                    set.reps,
                    set.rpe,
                ])?;
            }
        }

        tx.commit()?;
        debug!("Workout {} stored with {} sets", workout_id, sets.len());
        Ok(workout_id)
    }

    /// Latest workouts first
    pub fn recent_workouts(&self, user_id: i64, limit: usize) -> Result<Vec<WorkoutLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM workout_logs WHERE user_id = ?1 ORDER BY date DESC, id DESC LIMIT ?2"
        ))?;
        let workouts = stmt
            .query_map(params![user_id, limit as i64], workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    /// Workout by id, only if it belongs to the user
    pub fn workout(&self, user_id: i64, workout_id: i64) -> Result<Option<WorkoutLog>> {
        let workout = self
            .conn
            .query_row(
                &format!("SELECT {WORKOUT_COLUMNS} FROM workout_logs WHERE id = ?1 AND user_id = ?2"),
                params![workout_id, user_id],
                workout_from_row,
            )
            .optional()?;
        Ok(workout)
    }

    pub fn sets_for_workout(&self, workout_id: i64) -> Result<Vec<SetLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, workout_log_id, exercise_name, set_index, weight, reps, rpe FROM set_logs WHERE workout_log_id = ?1 ORDER BY id",
        )?;
        let sets = stmt
            .query_map(params![workout_id], |row| {
                Ok(SetLog {
                    id: row.get(0)?,
                    workout_log_id: row.get(1)?,
                    exercise_name: row.get(2)?,
                    set_index: row.get(3)?,
                    weight: row.get(4)?,
                    reps: row.get(5)?,
                    rpe: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    /// Sets of a user's workouts dated within `[from, to]`, oldest first
    pub fn sets_between(&self, user_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<LoggedSet>> {
        let mut stmt = self.conn.prepare(
            "SELECT w.date, s.exercise_name, s.weight, s.reps, s.rpe
             FROM set_logs s JOIN workout_logs w ON s.workout_log_id = w.id
             WHERE w.user_id = ?1 AND w.date >= ?2 AND w.date <= ?3
             ORDER BY w.date, s.id",
        )?;
        let sets = stmt
            .query_map(
                params![
                    user_id,
                    from.format(DATE_FORMAT).to_string(),
                    to.format(DATE_FORMAT).to_string(),
                ],
                |row| {
                    let date: String = row.get(0)?;
                    Ok(LoggedSet {
                        date: parse_date(0, &date)?,
                        exercise_name: row.get(1)?,
                        weight: row.get(2)?,
                        reps: row.get(3)?,
                        rpe: row.get(4)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }
}
