// Terminal rendering for tasks, timers and day summaries

use std::io::IsTerminal;
use chrono::{Local, NaiveDate, TimeZone};
use crate::models::{TaskEntry, Timer};
use crate::summary::{filter_by_type, task_elapsed, tag_types, DayAggregator, DaySummary, RunningSet, TagStat};
use crate::utils::{format_day, format_duration, format_stopwatch, FixedClock};

const ANSI_RESET: &str = "\x1b[0m";
const ANSI_BOLD: &str = "\x1b[1m";

const TITLE_WIDTH: usize = 40;
const BAR_WIDTH: usize = 20;

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Truecolor foreground escape for a `#rrggbb` color
fn hex_to_ansi_fg(hex: &str) -> Option<String> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(format!("\x1b[38;2;{};{};{}m", r, g, b))
}

fn colorize(text: &str, hex: &str, is_tty: bool) -> String {
    match hex_to_ansi_fg(hex) {
        Some(fg) if is_tty => format!("{}{}{}", fg, text, ANSI_RESET),
        _ => text.to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// Format timestamp for display
pub fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}

fn tag_list(entry: &TaskEntry, is_tty: bool) -> String {
    entry.tags
        .iter()
        .map(|tag| colorize(&format!("{}:{}", tag.tag_type, tag.value), &tag.color, is_tty))
        .collect::<Vec<_>>()
        .join(" ")
}

fn timer_cell(entry: &TaskEntry, running: &RunningSet, now: i64) -> String {
    match &entry.timer {
        None => "-".to_string(),
        Some(timer) => {
            let elapsed = task_elapsed(entry, running, now);
            if timer.is_running() {
                format!("{} *", format_stopwatch(elapsed))
            } else {
                format_stopwatch(elapsed)
            }
        }
    }
}

/// Table of a day's tasks. Running timers are marked with `*`.
pub fn format_task_list(entries: &[TaskEntry], running: &RunningSet, now: i64, is_tty: bool) -> String {
    if entries.is_empty() {
        return "No tasks.".to_string();
    }

    let id_width = entries
        .iter()
        .map(|entry| entry.id().to_string().len())
        .max()
        .unwrap_or(2)
        .max(2);
    let title_width = entries
        .iter()
        .map(|entry| entry.task.title.chars().count().min(TITLE_WIDTH))
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    let header = format!(
        "{:<id$} {:<4} {} {:>10}  {}",
        "ID", "Done", pad("Title", title_width), "Timer", "Tags",
        id = id_width,
    );
    output.push_str(&bold_if_tty(&header, is_tty));
    output.push('\n');
    output.push_str(&"-".repeat(id_width + title_width + 24));
    output.push('\n');

    for entry in entries {
        let done = if entry.task.completed { "[x]" } else { "[ ]" };
        let title = pad(&truncate(&entry.task.title, title_width), title_width);
        output.push_str(&format!(
            "{:<id$} {:<4} {} {:>10}  {}",
            entry.id(),
            done,
            title,
            timer_cell(entry, running, now),
            tag_list(entry, is_tty),
            id = id_width,
        ));
        output.push('\n');
    }

    output.trim_end().to_string()
}

/// One-line state of a timer
pub fn format_timer(timer: &Timer, now: i64) -> String {
    let id = timer.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string());
    match timer.start_ts {
        Some(start_ts) => format!(
            "Timer {} (task {}): running {} since {}",
            id,
            timer.task_id,
            format_stopwatch(timer.elapsed_now(now)),
            format_timestamp(start_ts)
        ),
        None => format!(
            "Timer {} (task {}): idle, {} recorded",
            id,
            timer.task_id,
            format_duration(timer.elapsed_now(now))
        ),
    }
}

/// Detailed view of one task
pub fn format_task_summary(entry: &TaskEntry, running: &RunningSet, now: i64) -> String {
    let task = &entry.task;
    let mut output = String::new();

    let header = format!("Task {}: {}", entry.id(), task.title);
    output.push_str(&header);
    output.push('\n');
    output.push_str(&"=".repeat(header.chars().count().max(40)));
    output.push_str("\n\n");

    if let Some(description) = &task.description {
        output.push_str("Description:\n");
        output.push_str(&format!("  {}\n\n", description));
    }

    output.push_str(&format!("Day:       {}\n", format_day(task.day)));
    output.push_str(&format!("Status:    {}\n", if task.completed { "completed" } else { "open" }));
    output.push_str(&format!("Created:   {}\n", format_timestamp(task.created_ts)));
    output.push_str(&format!("Modified:  {}\n\n", format_timestamp(task.modified_ts)));

    output.push_str("Tags:\n");
    if entry.tags.is_empty() {
        output.push_str("  (none)\n");
    }
    for tag in &entry.tags {
        output.push_str(&format!("  {:<12} {:<20} {}\n", tag.tag_type, tag.value, tag.color));
    }
    output.push('\n');

    output.push_str("Timer:\n");
    match &entry.timer {
        Some(timer) => {
            output.push_str(&format!("  {}\n", format_timer(timer, now)));
            output.push_str(&format!("  Elapsed: {}\n", format_stopwatch(task_elapsed(entry, running, now))));
        }
        None => output.push_str("  (none)\n"),
    }

    output.trim_end().to_string()
}

fn share_bar(percentage: f64) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn format_tag_rows(stats: &[TagStat], is_tty: bool) -> String {
    let label_width = stats
        .iter()
        .map(|stat| stat.value.chars().count())
        .max()
        .unwrap_or(0)
        .max(8);

    let mut output = String::new();
    for stat in stats {
        let label = pad(&stat.value, label_width);
        output.push_str(&format!(
            "    {} {:>8}  {:>5.1}%  {}\n",
            colorize(&label, &stat.color, is_tty),
            format_duration(stat.seconds),
            stat.percentage,
            share_bar(stat.percentage),
        ));
    }
    output
}

/// Day total plus the per-tag breakdown, grouped by tag type.
///
/// A task counts toward every tag it carries, so the rows of one type can add
/// up to more than the day total.
pub fn format_day_summary(summary: &DaySummary, tag_type: Option<&str>, is_tty: bool) -> String {
    let mut output = String::new();

    let header = format!("Day summary for {}", format_day(summary.day));
    output.push_str(&bold_if_tty(&header, is_tty));
    output.push('\n');
    output.push_str(&"=".repeat(header.len()));
    output.push('\n');
    output.push_str(&format!(
        "Tasks: {} ({} completed, {} running)\n",
        summary.task_count, summary.completed_count, summary.running_count
    ));
    output.push_str(&format!("Total: {}\n", format_duration(summary.total_secs)));

    let stats = filter_by_type(&summary.tags, tag_type);
    if stats.is_empty() {
        match tag_type {
            Some(tag_type) => output.push_str(&format!("\nNo tags of type '{}'.\n", tag_type)),
            None if summary.task_count > 0 => output.push_str("\nNo tagged tasks.\n"),
            None => {}
        }
        return output.trim_end().to_string();
    }

    for group in tag_types(&stats) {
        let rows: Vec<TagStat> = stats.iter().filter(|stat| stat.tag_type == group).cloned().collect();
        output.push('\n');
        output.push_str(&format!("  {}\n", bold_if_tty(&group, is_tty)));
        output.push_str(&format_tag_rows(&rows, is_tty));
    }

    output.trim_end().to_string()
}

/// One repaint of `watch`: task table followed by the summary
pub fn format_watch_frame(day: NaiveDate, entries: &[TaskEntry], running: &RunningSet, now: i64, is_tty: bool) -> String {
    // Rows and total must agree on the same instant
    let clock = FixedClock::at(now);
    let summary = DayAggregator::new(running, &clock).summarize(day, entries);
    format!(
        "{}\n\n{}",
        format_task_list(entries, running, now, is_tty),
        format_day_summary(&summary, None, is_tty)
    )
}
