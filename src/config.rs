//! Runtime configuration gathered from CLI flags and the environment

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use crate::db::{Database, User};
use crate::program::Program;

pub const DEFAULT_DB_PATH: &str = "liftlog.db";
pub const DEFAULT_PROGRAM_PATH: &str = "program.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub program_path: PathBuf,
    /// Email of the user the command acts for
    pub user: Option<String>,
}

impl Config {
    pub fn open_db(&self) -> Result<Database> {
        Database::open(&self.db_path)
    }

    /// Load the program or fail; there is no fallback program
    pub fn load_program(&self) -> Result<Program> {
        Program::load(&self.program_path).with_context(|| {
            format!(
                "cannot start without a valid program (try `liftlog program init {}`)",
                self.program_path.display()
            )
        })
    }

    pub fn current_user(&self, db: &Database) -> Result<User> {
        let Some(email) = self.user.as_deref() else {
            anyhow::bail!("no user selected: pass --user or set LIFTLOG_USER");
        };
        match db.user_by_email(email)? {
            Some(user) => Ok(user),
            None => {
                warn!("Unknown user {}", email);
                anyhow::bail!("user {} not found (register with `liftlog user add {}`)", email, email)
            }
        }
    }
}
