use clap::{Parser, Subcommand};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use anyhow::{Context, Result};
use crate::db::DbConnection;
use crate::models::{NewTask, TaskEntry, TaskUpdate};
use crate::repo::{TaskRepo, TimerRepo, UserRepo};
use crate::cli::error::{parse_tag_args, user_error, validate_non_empty, validate_task_id, validate_timer_id};
use crate::cli::output::{format_day_summary, format_task_list, format_task_summary, format_timer, format_watch_frame, is_tty};
use crate::cli::session::{Session, SessionStore};
use crate::summary::{filter_by_type, task_elapsed, DayAggregator, RunningSet};
use crate::utils::{format_day, format_duration, parse_day_expr, parse_duration, today, SystemClock, TimeSource};

#[derive(Parser)]
#[command(name = "dayledger")]
#[command(about = "Day Ledger - day-based task and time tracking")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in as a user, creating the user on first login
    Login {
        /// Username (exact match)
        username: String,
        /// Display name for a new user
        #[arg(long)]
        name: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Add a task to a day
    Add {
        /// Task title
        #[arg(required = true)]
        title: Vec<String>,
        /// Day (today, yesterday, tomorrow or YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Longer description
        #[arg(long = "desc")]
        description: Option<String>,
        /// Tag as type:value (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Create a timer for the task
        #[arg(long)]
        timer: bool,
    },
    /// List a day's tasks
    List {
        /// Day to list; defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show task details
    Show {
        /// Task ID
        task_id: String,
    },
    /// Modify a task
    Modify {
        /// Task ID
        task_id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description (empty clears it)
        #[arg(long = "desc")]
        description: Option<String>,
        /// Replace tags with these type:value tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Remove all tags
        #[arg(long)]
        clear_tags: bool,
    },
    /// Mark a task completed
    Done {
        /// Task ID
        task_id: String,
        /// Reopen instead
        #[arg(long)]
        undo: bool,
    },
    /// Permanently delete a task with its timer and tags
    Delete {
        /// Task ID
        task_id: String,
        /// Delete without confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Copy a task to another day and complete the original
    Migrate {
        /// Task ID
        task_id: String,
        /// Target day; defaults to today
        #[arg(long)]
        to: Option<String>,
    },
    /// Timer management commands
    Timer {
        #[command(subcommand)]
        subcommand: TimerCommands,
    },
    /// Start timing a task, creating its timer if needed
    On {
        /// Task ID
        task_id: String,
    },
    /// Stop timing a task
    Off {
        /// Task ID
        task_id: String,
    },
    /// Show total and per-tag time for a day
    Summary {
        /// Day to summarize; defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Only show tags of this type
        #[arg(long = "type")]
        tag_type: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Live view of a day, repainted every second while a timer runs
    Watch {
        /// Day to watch; defaults to today
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TimerCommands {
    /// Create the timer of a task
    Create {
        /// Task ID
        task_id: String,
    },
    /// Start a timer (no-op when already running)
    Start {
        /// Timer ID
        timer_id: String,
    },
    /// Stop a running timer
    Stop {
        /// Timer ID
        timer_id: String,
        /// Elapsed time measured by the caller (e.g. 25m); informational only
        #[arg(long)]
        reported: Option<String>,
    },
    /// Show a timer
    Show {
        /// Timer ID
        timer_id: String,
    },
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Usage errors are user errors (exit 1); help and version are not errors
        Err(e) if e.use_stderr() => {
            e.print()?;
            std::process::exit(1);
        }
        Err(e) => {
            e.print()?;
            return Ok(());
        }
    };
    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { username, name } => handle_login(username, name),
        Commands::Logout => handle_logout(),
        Commands::Whoami => handle_whoami(),
        Commands::Add { title, date, description, tags, timer } => {
            handle_task_add(title, date, description, tags, timer)
        }
        Commands::List { date, json } => handle_task_list(date, json),
        Commands::Show { task_id } => handle_task_show(task_id),
        Commands::Modify { task_id, title, description, tags, clear_tags } => {
            handle_task_modify(task_id, title, description, tags, clear_tags)
        }
        Commands::Done { task_id, undo } => handle_task_done(task_id, undo),
        Commands::Delete { task_id, yes } => handle_task_delete(task_id, yes),
        Commands::Migrate { task_id, to } => handle_task_migrate(task_id, to),
        Commands::Timer { subcommand } => handle_timer(subcommand),
        Commands::On { task_id } => handle_on(task_id),
        Commands::Off { task_id } => handle_off(task_id),
        Commands::Summary { date, tag_type, json } => handle_summary(date, tag_type, json),
        Commands::Watch { date } => handle_watch(date),
    }
}

fn connect() -> Result<Connection> {
    DbConnection::connect().context("Failed to connect to database")
}

fn session_store() -> Result<SessionStore> {
    SessionStore::default_location().context("Failed to locate session file")
}

/// Load the session and check that its user still exists in this ledger
fn require_session(conn: &Connection) -> Result<Session> {
    let session = match session_store()?.load()? {
        Some(session) => session,
        None => user_error("Not logged in. Run 'dayledger login <username>' first."),
    };
    match UserRepo::get_by_id(conn, session.user_id)? {
        Some(user) if user.username == session.username => Ok(session),
        _ => user_error(&format!(
            "User '{}' from the saved session does not exist. Log in again.",
            session.username
        )),
    }
}

fn parse_day_arg(expr: Option<String>) -> NaiveDate {
    match expr {
        None => today(),
        Some(expr) => parse_day_expr(&expr).unwrap_or_else(|e| user_error(&e.to_string())),
    }
}

fn parse_task_arg(id_str: &str) -> i64 {
    validate_task_id(id_str).unwrap_or_else(|e| user_error(&e))
}

fn parse_timer_arg(id_str: &str) -> i64 {
    validate_timer_id(id_str).unwrap_or_else(|e| user_error(&e))
}

fn handle_login(username: String, name: Option<String>) -> Result<()> {
    let conn = connect()?;
    let user = UserRepo::login_or_create(&conn, &username, name.as_deref())?;
    session_store()?.save(&Session::from(&user))?;
    println!("Logged in as {} ({})", user.display_name, user.username);
    Ok(())
}

fn handle_logout() -> Result<()> {
    if session_store()?.clear()? {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

fn handle_whoami() -> Result<()> {
    let conn = connect()?;
    let session = require_session(&conn)?;
    let running = TimerRepo::list_running(&conn, session.user_id)?;
    println!("{} ({})", session.display_name, session.username);
    println!("Running timers: {}", running.len());
    Ok(())
}

fn handle_task_add(title: Vec<String>, date: Option<String>, description: Option<String>, tags: Vec<String>, with_timer: bool) -> Result<()> {
    let title = title.join(" ");
    if let Err(e) = validate_non_empty(&title, "Task title") {
        user_error(&e);
    }
    let day = parse_day_arg(date);
    let tags = parse_tag_args(&tags).unwrap_or_else(|e| user_error(&e));

    let conn = connect()?;
    let session = require_session(&conn)?;
    let entry = TaskRepo::create(&conn, session.user_id, &NewTask {
        title,
        description,
        day: Some(day),
        tags,
    })?;

    println!("Created task {}: {} ({})", entry.id(), entry.task.title, format_day(day));
    if with_timer {
        let timer = TimerRepo::create(&conn, session.user_id, entry.id())?;
        println!("Created timer {} for task {}", timer.id.unwrap_or_default(), entry.id());
    }
    Ok(())
}

/// Task row in `list --json`
#[derive(Serialize)]
struct TaskListItem<'a> {
    #[serde(flatten)]
    entry: &'a TaskEntry,
    elapsed_secs: u64,
    running: bool,
}

fn handle_task_list(date: Option<String>, json: bool) -> Result<()> {
    let day = parse_day_arg(date);
    let conn = connect()?;
    let session = require_session(&conn)?;

    let entries = TaskRepo::list_for_day(&conn, session.user_id, day)?;
    let running = RunningSet::from_entries(&entries);
    let now = SystemClock.now();

    if json {
        let items: Vec<TaskListItem> = entries
            .iter()
            .map(|entry| TaskListItem {
                entry,
                elapsed_secs: task_elapsed(entry, &running, now),
                running: entry.timer_id().map_or(false, |id| running.contains(id)),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        println!("{}", format_task_list(&entries, &running, now, is_tty()));
    }
    Ok(())
}

fn handle_task_show(task_id: String) -> Result<()> {
    let task_id = parse_task_arg(&task_id);
    let conn = connect()?;
    let session = require_session(&conn)?;

    let entry = TaskRepo::get(&conn, session.user_id, task_id)?;
    let running = RunningSet::from_entries(std::slice::from_ref(&entry));
    println!("{}", format_task_summary(&entry, &running, SystemClock.now()));
    Ok(())
}

fn handle_task_modify(task_id: String, title: Option<String>, description: Option<String>, tags: Vec<String>, clear_tags: bool) -> Result<()> {
    let task_id = parse_task_arg(&task_id);
    let tags = if !tags.is_empty() {
        Some(parse_tag_args(&tags).unwrap_or_else(|e| user_error(&e)))
    } else if clear_tags {
        Some(Vec::new())
    } else {
        None
    };
    let update = TaskUpdate {
        title,
        description: description.map(Some),
        completed: None,
        tags,
    };
    if update.is_empty() {
        user_error("No modifications specified. Use --title, --desc, --tag or --clear-tags.");
    }

    let conn = connect()?;
    let session = require_session(&conn)?;
    let entry = TaskRepo::update(&conn, session.user_id, task_id, &update)?;
    println!("Modified task {}: {}", entry.id(), entry.task.title);
    Ok(())
}

fn handle_task_done(task_id: String, undo: bool) -> Result<()> {
    let task_id = parse_task_arg(&task_id);
    let conn = connect()?;
    let session = require_session(&conn)?;

    let update = TaskUpdate {
        completed: Some(!undo),
        ..Default::default()
    };
    let entry = TaskRepo::update(&conn, session.user_id, task_id, &update)?;
    if undo {
        println!("Reopened task {}: {}", entry.id(), entry.task.title);
    } else {
        println!("Completed task {}: {}", entry.id(), entry.task.title);
    }
    Ok(())
}

fn handle_task_delete(task_id: String, yes: bool) -> Result<()> {
    use std::io::{self, Write};

    let task_id = parse_task_arg(&task_id);
    let conn = connect()?;
    let session = require_session(&conn)?;
    let entry = TaskRepo::get(&conn, session.user_id, task_id)?;

    if !yes {
        print!("Delete task {} ({})? (y/n): ", task_id, entry.task.title);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();
        if input != "y" && input != "yes" {
            println!("Cancelled.");
            return Ok(());
        }
    }

    TaskRepo::delete(&conn, session.user_id, task_id)?;
    println!("Deleted task {}: {}", task_id, entry.task.title);
    Ok(())
}

fn handle_task_migrate(task_id: String, to: Option<String>) -> Result<()> {
    let task_id = parse_task_arg(&task_id);
    let to_day = parse_day_arg(to);
    let conn = connect()?;
    let session = require_session(&conn)?;

    let copy = TaskRepo::migrate(&conn, session.user_id, task_id, to_day)?;
    println!(
        "Migrated task {} to {} as task {}: {}",
        task_id,
        format_day(to_day),
        copy.id(),
        copy.task.title
    );
    Ok(())
}

fn handle_timer(subcommand: TimerCommands) -> Result<()> {
    let conn = connect()?;
    let session = require_session(&conn)?;
    let now = SystemClock.now();

    match subcommand {
        TimerCommands::Create { task_id } => {
            let task_id = parse_task_arg(&task_id);
            let timer = TimerRepo::create(&conn, session.user_id, task_id)?;
            println!("Created timer {} for task {}", timer.id.unwrap_or_default(), task_id);
        }
        TimerCommands::Start { timer_id } => {
            let timer_id = parse_timer_arg(&timer_id);
            start_timer(&conn, &session, timer_id, now)?;
        }
        TimerCommands::Stop { timer_id, reported } => {
            let timer_id = parse_timer_arg(&timer_id);
            let reported = reported.map(|expr| {
                parse_duration(&expr).unwrap_or_else(|e| user_error(&e.to_string()))
            });
            stop_timer(&conn, &session, timer_id, now, reported)?;
        }
        TimerCommands::Show { timer_id } => {
            let timer_id = parse_timer_arg(&timer_id);
            let timer = TimerRepo::get(&conn, session.user_id, timer_id)?;
            println!("{}", format_timer(&timer, now));
        }
    }
    Ok(())
}

fn start_timer(conn: &Connection, session: &Session, timer_id: i64, now: i64) -> Result<()> {
    let before = TimerRepo::get(conn, session.user_id, timer_id)?;
    let timer = TimerRepo::start(conn, session.user_id, timer_id, now)?;
    if before.is_running() {
        println!("Timer {} already running. {}", timer_id, format_timer(&timer, now));
    } else {
        println!("Started timer {} for task {}", timer_id, timer.task_id);
    }
    Ok(())
}

fn stop_timer(conn: &Connection, session: &Session, timer_id: i64, now: i64, reported: Option<i64>) -> Result<()> {
    let before = TimerRepo::get(conn, session.user_id, timer_id)?;
    let timer = TimerRepo::stop(conn, session.user_id, timer_id, now, reported)?;
    let added = (timer.duration_secs - before.duration_secs).max(0) as u64;
    println!(
        "Stopped timer {} for task {}: +{} (total {})",
        timer_id,
        timer.task_id,
        format_duration(added),
        format_duration(timer.duration_secs.max(0) as u64)
    );
    Ok(())
}

fn handle_on(task_id: String) -> Result<()> {
    let task_id = parse_task_arg(&task_id);
    let conn = connect()?;
    let session = require_session(&conn)?;

    let entry = TaskRepo::get(&conn, session.user_id, task_id)?;
    let timer_id = match entry.timer_id() {
        Some(timer_id) => timer_id,
        None => {
            let timer = TimerRepo::create(&conn, session.user_id, task_id)?;
            log::debug!("Created timer {:?} for task {}", timer.id, task_id);
            timer.id.unwrap_or_default()
        }
    };
    start_timer(&conn, &session, timer_id, SystemClock.now())
}

fn handle_off(task_id: String) -> Result<()> {
    let task_id = parse_task_arg(&task_id);
    let conn = connect()?;
    let session = require_session(&conn)?;

    let entry = TaskRepo::get(&conn, session.user_id, task_id)?;
    match entry.timer_id() {
        Some(timer_id) => stop_timer(&conn, &session, timer_id, SystemClock.now(), None),
        None => user_error(&format!("Task {} has no timer", task_id)),
    }
}

fn handle_summary(date: Option<String>, tag_type: Option<String>, json: bool) -> Result<()> {
    let day = parse_day_arg(date);
    let conn = connect()?;
    let session = require_session(&conn)?;

    let entries = TaskRepo::list_for_day(&conn, session.user_id, day)?;
    let running = RunningSet::from_entries(&entries);
    let clock = SystemClock;
    let mut summary = DayAggregator::new(&running, &clock).summarize(day, &entries);

    if json {
        summary.tags = filter_by_type(&summary.tags, tag_type.as_deref());
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", format_day_summary(&summary, tag_type.as_deref(), is_tty()));
    }
    Ok(())
}

/// Repaint the day until no timer is running.
///
/// Each frame reloads the day and recomputes elapsed time from the stored
/// start timestamps; the loop itself carries no elapsed state.
fn handle_watch(date: Option<String>) -> Result<()> {
    let day = parse_day_arg(date);
    let conn = connect()?;
    let session = require_session(&conn)?;
    let tty = is_tty();

    loop {
        let entries = TaskRepo::list_for_day(&conn, session.user_id, day)?;
        let running = RunningSet::from_entries(&entries);

        if tty {
            // Clear screen, cursor home
            print!("\x1b[2J\x1b[H");
        }
        println!("{}", format_watch_frame(day, &entries, &running, SystemClock.now(), tty));

        match running.tick_interval() {
            Some(interval) => std::thread::sleep(interval),
            None => {
                println!("\nNo running timers.");
                return Ok(());
            }
        }
    }
}
