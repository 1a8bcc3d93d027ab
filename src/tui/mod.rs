//! TUI module - Terminal dashboard with ratatui

use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::io::{stdout, Stdout};

use crate::dashboard::{Dashboard, Viewer};
use crate::db::Database;
use crate::program::Program;

type Tui = Terminal<CrosstermBackend<Stdout>>;

const RECENT_WORKOUTS: usize = 10;

/// App state for TUI
pub struct App<'a> {
    db: Database,
    program: &'a Program,
    dashboard: Dashboard,
    should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(db: Database, program: &'a Program, dashboard: Dashboard) -> Self {
        Self {
            db,
            program,
            dashboard,
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        let result = self.event_loop(&mut terminal);

        restore_terminal()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn refresh(&mut self, today: NaiveDate) -> Result<()> {
        self.dashboard = Dashboard::load(
            &self.db,
            self.program,
            self.dashboard.user.clone(),
            self.dashboard.viewer,
            today,
            RECENT_WORKOUTS,
        )?;
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let dash = &self.dashboard;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let header = Paragraph::new(dash.title())
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        // Today's plan
        match &dash.plan {
            Ok(plan) => {
                let rows: Vec<Row> = plan.exercises.iter().map(|ex| {
                    Row::new(vec![
                        Cell::from(ex.name.clone()),
                        Cell::from(format!("{}x{}", ex.sets, ex.reps)),
                        Cell::from(ex.notes.clone()),
                    ])
                }).collect();

                let deload = if plan.is_deload { " - deload" } else { "" };
                let title = format!(
                    "Today: {} {} | week {}/{}{}",
                    plan.split_key, plan.split_name, plan.week_number, plan.cycle_weeks, deload
                );
                let table = Table::new(
                    rows,
                    [Constraint::Min(18), Constraint::Length(8), Constraint::Min(10)],
                )
                .header(Row::new(vec!["Exercise", "Sets x Reps", "Notes"])
                    .style(Style::default().bold()))
                .block(Block::default().borders(Borders::ALL).title(title));
                frame.render_widget(table, top[0]);
            }
            Err(e) => {
                let msg = Paragraph::new(e.clone())
                    .style(Style::default().fg(Color::Red))
                    .block(Block::default().borders(Borders::ALL).title("Today"));
                frame.render_widget(msg, top[0]);
            }
        }

        // Weekly volume and e1RM side by side
        let rows: Vec<Row> = dash.weekly_volume.iter().map(|(exercise, volume)| {
            let e1rm = dash.best_e1rm.get(exercise)
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(exercise.clone()),
                Cell::from(format!("{:.0}", volume.volume)),
                Cell::from(format!("{}/{}", volume.sets, volume.reps)),
                Cell::from(e1rm),
            ])
        }).chain(
            dash.best_e1rm.iter()
                .filter(|(exercise, _)| !dash.weekly_volume.contains_key(*exercise))
                .map(|(exercise, e1rm)| Row::new(vec![
                    Cell::from(exercise.clone()),
                    Cell::from("-"),
                    Cell::from("-"),
                    Cell::from(format!("{:.1}", e1rm)),
                ]))
        ).collect();

        let stats = Table::new(
            rows,
            [Constraint::Min(18), Constraint::Length(10), Constraint::Length(10), Constraint::Length(10)],
        )
        .header(Row::new(vec!["Exercise", "Volume", "Sets/Reps", "e1RM"])
            .style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("This week / 4-week best"));
        frame.render_widget(stats, top[1]);

        // Recent workouts
        let rows: Vec<Row> = dash.recent_workouts.iter().map(|w| {
            Row::new(vec![
                Cell::from(w.date.format("%Y-%m-%d").to_string()),
                Cell::from(w.workout_name.clone()),
                Cell::from(format!("{} / wk {}", w.split_key, w.week_number)),
                Cell::from(w.notes.clone().unwrap_or_default()),
            ])
        }).collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(24),
                Constraint::Length(10),
                Constraint::Min(20),
            ],
        )
        .header(Row::new(vec!["Date", "Workout", "Split", "Notes"])
            .style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Recent workouts"));
        frame.render_widget(table, chunks[2]);

        // Footer
        let footer_text = match dash.viewer {
            Viewer::Owner => format!("q: quit | r: refresh | coach token: {}", dash.user.share_token),
            Viewer::Coach => "q: quit | r: refresh".to_string(),
        };
        let footer = Paragraph::new(footer_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                        KeyCode::Char('r') => self.refresh(Local::now().date_naive())?,
                        _ => {}
                    }
                }
        Ok(())
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
