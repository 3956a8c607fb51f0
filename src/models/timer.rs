use serde::{Deserialize, Serialize};
use crate::error::{LedgerError, LedgerResult};

/// Timer lifecycle state, derived from `start_ts`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running { since: i64 },
}

/// Per-task stopwatch.
///
/// `duration_secs` is the persisted baseline: the sum of every finished run.
/// It never includes the run in progress, which is always re-derived from
/// `start_ts` against the caller's clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub id: Option<i64>,
    pub task_id: i64,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub duration_secs: i64,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Timer {
    /// Create an idle timer with nothing accumulated
    pub fn new(task_id: i64, now: i64) -> Self {
        Self {
            id: None,
            task_id,
            start_ts: None,
            end_ts: None,
            duration_secs: 0,
            created_ts: now,
            modified_ts: now,
        }
    }

    pub fn state(&self) -> TimerState {
        match self.start_ts {
            Some(since) => TimerState::Running { since },
            None => TimerState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.start_ts.is_some()
    }

    /// Begin a run at `now`.
    ///
    /// Returns false and changes nothing when the timer is already running;
    /// a repeated start never resets the run in progress.
    pub fn start(&mut self, now: i64) -> bool {
        if self.is_running() {
            return false;
        }
        self.start_ts = Some(now);
        self.end_ts = None;
        self.modified_ts = now;
        true
    }

    /// Finish the current run at `now`, folding its length into `duration_secs`.
    ///
    /// Returns the seconds added. Stopping an idle timer is a conflict and
    /// leaves the timer untouched.
    pub fn stop(&mut self, now: i64) -> LedgerResult<i64> {
        let since = match self.state() {
            TimerState::Running { since } => since,
            TimerState::Idle => {
                return Err(LedgerError::conflict(format!("{} is not running", self.label())));
            }
        };

        let run_secs = (now - since).max(0);
        self.duration_secs += run_secs;
        self.start_ts = None;
        self.end_ts = Some(now);
        self.modified_ts = now;
        Ok(run_secs)
    }

    /// Elapsed seconds as seen at `now`.
    ///
    /// `is_running` comes from the caller's running set, not from the timer
    /// itself. A timer reported as running without a `start_ts` only counts
    /// its baseline.
    pub fn elapsed(&self, is_running: bool, now: i64) -> u64 {
        let baseline = self.duration_secs.max(0) as u64;
        if !is_running {
            return baseline;
        }
        match self.start_ts {
            Some(since) => baseline + (now - since).max(0) as u64,
            None => baseline,
        }
    }

    /// Elapsed seconds using the timer's own running state
    pub fn elapsed_now(&self, now: i64) -> u64 {
        self.elapsed(self.is_running(), now)
    }

    fn label(&self) -> String {
        match self.id {
            Some(id) => format!("Timer {}", id),
            None => "Timer".to_string(),
        }
    }
}
