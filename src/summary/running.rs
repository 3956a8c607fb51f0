use std::collections::HashSet;
use std::time::Duration;
use crate::models::{TaskEntry, Timer};

/// Repaint cadence while at least one timer runs
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Identifiers of the timers currently ticking.
///
/// Held by the caller and passed to the aggregator explicitly. It carries no
/// elapsed counter: live time is always re-derived from each timer's own
/// `start_ts`, so missed or delayed ticks cannot cause drift.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunningSet {
    ids: HashSet<i64>,
}

impl RunningSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Running set as persisted: every timer with an open run
    pub fn from_timers<'a>(timers: impl IntoIterator<Item = &'a Timer>) -> Self {
        timers
            .into_iter()
            .filter(|timer| timer.is_running())
            .filter_map(|timer| timer.id)
            .collect()
    }

    pub fn from_entries(entries: &[TaskEntry]) -> Self {
        Self::from_timers(entries.iter().filter_map(|entry| entry.timer.as_ref()))
    }

    pub fn insert(&mut self, timer_id: i64) -> bool {
        self.ids.insert(timer_id)
    }

    pub fn remove(&mut self, timer_id: i64) -> bool {
        self.ids.remove(&timer_id)
    }

    pub fn contains(&self, timer_id: i64) -> bool {
        self.ids.contains(&timer_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Delay until the next repaint, or None when nothing runs and no tick
    /// should be scheduled
    pub fn tick_interval(&self) -> Option<Duration> {
        if self.is_empty() {
            None
        } else {
            Some(TICK_INTERVAL)
        }
    }
}

impl FromIterator<i64> for RunningSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self { ids: iter.into_iter().collect() }
    }
}
