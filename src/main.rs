//! liftlog - Periodized gym workout tracker

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;

use liftlog::analytics::Analytics;
use liftlog::config::{Config, DEFAULT_DB_PATH, DEFAULT_PROGRAM_PATH};
use liftlog::dashboard::{Dashboard, Viewer, WorkoutDetail};
use liftlog::db::{NewSet, NewWorkout};
use liftlog::program::{STARTER_PROGRAM, log_target, today_plan};
use liftlog::tui::App;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(author, version, about = "Periodized gym workout tracker")]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "LIFTLOG_DB", default_value = DEFAULT_DB_PATH)]
    db: String,

    /// Program definition (JSON)
    #[arg(long, global = true, env = "PROGRAM_JSON_PATH", default_value = DEFAULT_PROGRAM_PATH)]
    program: PathBuf,

    /// Email of the user to act as
    #[arg(short, long, global = true, env = "LIFTLOG_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Dashboard,

    /// Show today's split, cycle week and prescription
    Today {
        /// Force a split instead of the weekly alternation
        #[arg(short, long)]
        split: Option<String>,
    },

    /// Log a workout
    Log {
        /// Sets as EXERCISE:WEIGHTxREPS[@RPE], e.g. "Bench Press:100x5@8"
        #[arg(required = true)]
        sets: Vec<NewSet>,

        /// Split key (defaults to today's split)
        #[arg(short, long)]
        split: Option<String>,

        /// Cycle week (defaults to today's week)
        #[arg(short, long)]
        week: Option<u32>,

        /// Workout date, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Workout name (defaults to the split name)
        #[arg(long)]
        name: Option<String>,

        /// Optional notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List workout history
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show one workout with per-exercise volume and e1RM
    Show {
        workout_id: i64,
    },

    /// Weekly volume and best estimated 1RM
    Stats,

    /// Read-only coach view for a share token
    Coach {
        token: String,

        /// Show one workout of this user instead of the dashboard
        #[arg(short, long)]
        workout: Option<i64>,

        /// Print instead of opening the dashboard
        #[arg(long)]
        plain: bool,
    },

    /// Manage users
    #[command(subcommand)]
    User(UserCommands),

    /// Inspect or create the program file
    #[command(subcommand)]
    Program(ProgramCommands),
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a user and print their coach share token
    Add {
        email: String,

        #[arg(short, long)]
        name: Option<String>,

        /// First day of the cycle, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        cycle_start: Option<NaiveDate>,
    },

    /// List registered users
    List,
}

#[derive(Subcommand)]
enum ProgramCommands {
    /// Print the program, or one split for one week
    Show {
        #[arg(short, long)]
        split: Option<String>,

        #[arg(short, long, default_value = "1")]
        week: u32,
    },

    /// Write the starter 3+1 program to a file
    Init {
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config {
        db_path: cli.db,
        program_path: cli.program,
        user: cli.user,
    };
    let today = Local::now().date_naive();

    match cli.command {
        Some(Commands::Program(ProgramCommands::Init { path, force })) => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            std::fs::write(&path, STARTER_PROGRAM)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Starter program written to {}", path.display());
        }

        Some(Commands::Program(ProgramCommands::Show { split, week })) => {
            let program = config.load_program()?;
            println!("{} ({} week cycle)", program.name(), program.cycle_weeks());
            if !program.description().is_empty() {
                println!("{}", program.description());
            }
            println!("{:-<60}", "");

            let keys: Vec<_> = match split.as_deref() {
                Some(key) => vec![
                    program
                        .split_key(key)
                        .cloned()
                        .with_context(|| format!("unknown split '{}'", key))?,
                ],
                None => program.splits().iter().map(|(k, _)| k.clone()).collect(),
            };
            for key in keys {
                let Some(exercises) = program.prescription(&key, week) else {
                    anyhow::bail!("week must be between 1 and {}", program.cycle_weeks());
                };
                let name = program.split(&key).map(|s| s.name.as_str()).unwrap_or_default();
                println!("[{}] {} - week {}", key, name, week);
                for ex in exercises {
                    println!("  {:24} {}x{} {}", ex.name, ex.sets, ex.reps, ex.notes);
                }
            }
        }

        Some(Commands::User(UserCommands::Add { email, name, cycle_start })) => {
            let db = config.open_db()?;
            let user = db.add_user(&email, name.as_deref(), cycle_start)?;
            println!("Registered {} <{}>", user.name, user.email);
            println!("Cycle start: {}", user.cycle_start);
            println!("Coach share token: {}", user.share_token);
        }

        Some(Commands::User(UserCommands::List)) => {
            let db = config.open_db()?;
            for user in db.list_users()? {
                println!("{:30} | {:20} | cycle from {}", user.email, user.name, user.cycle_start);
            }
        }

        Some(Commands::Today { split }) => {
            let program = config.load_program()?;
            let db = config.open_db()?;
            let user = config.current_user(&db)?;
            let plan = today_plan(&program, user.cycle_start, today, split.as_deref())?;

            let deload = if plan.is_deload { " (deload)" } else { "" };
            println!(
                "{} | split {} - {} | week {}/{}{}",
                today, plan.split_key, plan.split_name, plan.week_number, plan.cycle_weeks, deload
            );
            if !plan.split_description.is_empty() {
                println!("{}", plan.split_description);
            }
            println!("{:-<60}", "");
            for ex in &plan.exercises {
                println!("{:24} {}x{} {}", ex.name, ex.sets, ex.reps, ex.notes);
            }
        }

        Some(Commands::Log { sets, split, week, date, name, notes }) => {
            let program = config.load_program()?;
            let db = config.open_db()?;
            let user = config.current_user(&db)?;
            let date = date.unwrap_or(today);

            let day = log_target(&program, user.cycle_start, date, split.as_deref(), week)?;
            let week_number = day.week_number;
            let workout_name = match name {
                Some(name) => name,
                None => program
                    .split(&day.split_key)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| day.split_key.to_string()),
            };

            let workout = NewWorkout {
                date,
                workout_name: workout_name.clone(),
                week_number,
                split_key: day.split_key.to_string(),
                notes,
            };
            let id = db.add_workout(user.id, &workout, &sets)?;
            info!("User {} logged workout {}", user.email, id);
            println!(
                "Logged: {} ({} sets, split {} week {}, id: {})",
                workout_name,
                sets.len(),
                day.split_key,
                week_number,
                id
            );
        }

        Some(Commands::History { limit }) => {
            let db = config.open_db()?;
            let user = config.current_user(&db)?;
            println!("Recent workouts:");
            println!("{:-<60}", "");
            for w in db.recent_workouts(user.id, limit)? {
                println!(
                    "#{:<4} {} | {:24} | {} / wk {} | {}",
                    w.id,
                    w.date,
                    w.workout_name,
                    w.split_key,
                    w.week_number,
                    w.notes.as_deref().unwrap_or("-")
                );
            }
        }

        Some(Commands::Show { workout_id }) => {
            let db = config.open_db()?;
            let user = config.current_user(&db)?;
            let Some(detail) = WorkoutDetail::load(&db, user.id, workout_id)? else {
                anyhow::bail!("workout {} not found", workout_id);
            };
            print!("{}", detail.render_plain());
        }

        Some(Commands::Stats) => {
            let db = config.open_db()?;
            let user = config.current_user(&db)?;
            let sets = db.sets_between(user.id, Analytics::lookback_start(today), today)?;
            let analytics = Analytics::new(sets);

            println!("Training Statistics");
            println!("{:-<40}", "");
            println!("Weekly volume:");
            for (exercise, v) in analytics.this_week_breakdown(today) {
                println!("  {:24} {:>10.2} | {} sets, {} reps", exercise, v.volume, v.sets, v.reps);
            }
            println!("Total: {:.2}", analytics.total_week_volume(today));
            println!("Best estimated 1RM (4 weeks):");
            for (exercise, e1rm) in analytics.best_one_rep_maxes(today) {
                println!("  {:24} {:.2}", exercise, e1rm);
            }
        }

        Some(Commands::Coach { token, workout, plain }) => {
            let db = config.open_db()?;
            let Some(user) = db.user_by_share_token(&token)? else {
                anyhow::bail!("not found");
            };
            info!("Coach view opened for user {}", user.id);

            if let Some(workout_id) = workout {
                let Some(detail) = WorkoutDetail::load(&db, user.id, workout_id)? else {
                    anyhow::bail!("not found");
                };
                print!("{}", detail.render_plain());
                return Ok(());
            }

            let program = config.load_program()?;
            let dashboard = Dashboard::load(&db, &program, user, Viewer::Coach, today, 10)?;
            if plain {
                print!("{}", dashboard.render_plain());
            } else {
                App::new(db, &program, dashboard).run()?;
            }
        }

        Some(Commands::Dashboard) | None => {
            let program = config.load_program()?;
            let db = config.open_db()?;
            let user = config.current_user(&db)?;
            let dashboard = Dashboard::load(&db, &program, user, Viewer::Owner, today, 10)?;
            App::new(db, &program, dashboard).run()?;
        }
    }

    Ok(())
}
