//! liftlog - Periodized gym workout tracker
//!
//! Logs sets against a JSON program, reports weekly volume and estimated
//! one-rep maxes, and exposes a read-only coach view through a share token.

pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod program;
pub mod tui;

pub use db::Database;
pub use program::Program;
