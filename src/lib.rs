//! Day Ledger - day-based task and time tracking
//!
//! This library provides the core functionality for Day Ledger, including:
//! - Database operations and migrations
//! - Data models for users, tasks, tags and timers
//! - Repository layer for data access, scoped by owner
//! - Timer lifecycle and the day summary aggregation engine
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use dayledger::summary::{DayAggregator, RunningSet};
//! use dayledger::utils::FixedClock;
//!
//! let running = RunningSet::new();
//! let clock = FixedClock::at(0);
//! let day = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
//! let summary = DayAggregator::new(&running, &clock).summarize(day, &[]);
//! assert_eq!(summary.total_secs, 0);
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod repo;
pub mod summary;
pub mod cli;
pub mod utils;
