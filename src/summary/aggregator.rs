use chrono::NaiveDate;
use serde::Serialize;
use crate::models::TaskEntry;
use crate::summary::{RunningSet, TagIndex, TagStat};
use crate::utils::TimeSource;

/// Elapsed seconds of one task at `now`; zero when it has no timer
pub fn task_elapsed(entry: &TaskEntry, running: &RunningSet, now: i64) -> u64 {
    match &entry.timer {
        Some(timer) => {
            let is_running = timer.id.map_or(false, |id| running.contains(id));
            timer.elapsed(is_running, now)
        }
        None => 0,
    }
}

/// Sum of every task's elapsed time at `now`
pub fn total_elapsed(tasks: &[TaskEntry], running: &RunningSet, now: i64) -> u64 {
    tasks.iter().map(|entry| task_elapsed(entry, running, now)).sum()
}

/// Time per `(type, value)` tag, most time first.
///
/// A task contributes its full elapsed time to every tag it carries; time is
/// not split between tags. Tags are not a partition of the day, so bucket
/// seconds may add up to more than the day total and percentages to more
/// than 100.
pub fn tag_breakdown(tasks: &[TaskEntry], running: &RunningSet, now: i64) -> Vec<TagStat> {
    let mut index = TagIndex::new();
    let mut total = 0u64;

    for entry in tasks {
        let elapsed = task_elapsed(entry, running, now);
        total += elapsed;
        for tag in &entry.tags {
            index.add(tag, elapsed);
        }
    }

    index.into_stats(total)
}

/// Entries of one tag type, or all of them for `None`
pub fn filter_by_type(breakdown: &[TagStat], tag_type: Option<&str>) -> Vec<TagStat> {
    match tag_type {
        None => breakdown.to_vec(),
        Some(tag_type) => breakdown
            .iter()
            .filter(|stat| stat.tag_type == tag_type)
            .cloned()
            .collect(),
    }
}

/// Distinct tag types in breakdown order
pub fn tag_types(breakdown: &[TagStat]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for stat in breakdown {
        if !types.contains(&stat.tag_type) {
            types.push(stat.tag_type.clone());
        }
    }
    types
}

/// Snapshot of a day's time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub day: NaiveDate,
    pub task_count: usize,
    pub completed_count: usize,
    pub running_count: usize,
    pub total_secs: u64,
    pub tags: Vec<TagStat>,
}

/// Blends persisted durations with live elapsed time for a day's tasks.
///
/// The clock is sampled once per call so the total and the breakdown of one
/// summary agree with each other.
pub struct DayAggregator<'a> {
    running: &'a RunningSet,
    clock: &'a dyn TimeSource,
}

impl<'a> DayAggregator<'a> {
    pub fn new(running: &'a RunningSet, clock: &'a dyn TimeSource) -> Self {
        Self { running, clock }
    }

    pub fn summarize(&self, day: NaiveDate, tasks: &[TaskEntry]) -> DaySummary {
        let now = self.clock.now();
        let running_count = tasks
            .iter()
            .filter_map(|entry| entry.timer_id())
            .filter(|id| self.running.contains(*id))
            .count();

        DaySummary {
            day,
            task_count: tasks.len(),
            completed_count: tasks.iter().filter(|entry| entry.task.completed).count(),
            running_count,
            total_secs: total_elapsed(tasks, self.running, now),
            tags: tag_breakdown(tasks, self.running, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Tag, Task, Timer};
    use crate::utils::FixedClock;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
    }

    fn entry(id: i64, timer: Option<(i64, Option<i64>)>, tags: &[(&str, &str)]) -> TaskEntry {
        let mut task = Task::new(1, format!("Task {}", id), day());
        task.id = Some(id);
        TaskEntry {
            task,
            timer: timer.map(|(duration_secs, start_ts)| Timer {
                id: Some(id * 10),
                task_id: id,
                start_ts,
                end_ts: None,
                duration_secs,
                created_ts: 0,
                modified_ts: 0,
            }),
            tags: tags
                .iter()
                .map(|(tag_type, value)| Tag {
                    id: None,
                    task_id: id,
                    tag_type: tag_type.to_string(),
                    value: value.to_string(),
                    color: crate::models::color_for_type(tag_type).to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_total_blends_idle_and_running() {
        // A: idle, 120s. B: 30s stored, running for the last 45s.
        let now = 10_000;
        let tasks = vec![
            entry(1, Some((120, None)), &[]),
            entry(2, Some((30, Some(now - 45))), &[]),
        ];
        let running: RunningSet = [20].into_iter().collect();

        assert_eq!(total_elapsed(&tasks, &running, now), 195);
    }

    #[test]
    fn test_task_without_timer_contributes_nothing() {
        let tasks = vec![entry(1, None, &[("pessoa", "Ana")]), entry(2, Some((60, None)), &[])];
        let running = RunningSet::new();
        assert_eq!(total_elapsed(&tasks, &running, 0), 60);

        let stats = tag_breakdown(&tasks, &running, 0);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].seconds, 0);
        assert_eq!(stats[0].percentage, 0.0);
    }

    #[test]
    fn test_running_set_decides_live_time() {
        // Timer has an open run but the caller does not list it as running
        let tasks = vec![entry(1, Some((30, Some(1000))), &[])];
        assert_eq!(total_elapsed(&tasks, &RunningSet::new(), 2000), 30);

        let running: RunningSet = [10].into_iter().collect();
        assert_eq!(total_elapsed(&tasks, &running, 2000), 1030);
    }

    #[test]
    fn test_each_running_timer_uses_its_own_start() {
        let now = 5000;
        let tasks = vec![
            entry(1, Some((0, Some(now - 100))), &[]),
            entry(2, Some((0, Some(now - 10))), &[]),
        ];
        let running = RunningSet::from_entries(&tasks);

        assert_eq!(task_elapsed(&tasks[0], &running, now), 100);
        assert_eq!(task_elapsed(&tasks[1], &running, now), 10);
        assert_eq!(total_elapsed(&tasks, &running, now), 110);
    }

    #[test]
    fn test_multi_tag_task_counts_in_every_bucket() {
        let tasks = vec![entry(1, Some((100, None)), &[("pessoa", "Ana"), ("tipo", "reunião")])];
        let running = RunningSet::new();

        let stats = tag_breakdown(&tasks, &running, 0);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].seconds, 100);
        assert_eq!(stats[1].seconds, 100);
        assert_eq!(stats[0].percentage, 100.0);
        assert_eq!(stats[1].percentage, 100.0);

        let bucket_sum: u64 = stats.iter().map(|s| s.seconds).sum();
        assert!(bucket_sum > total_elapsed(&tasks, &running, 0));
    }

    #[test]
    fn test_breakdown_sorted_with_percentages() {
        let tasks = vec![
            entry(1, Some((60, None)), &[("pessoa", "Ana")]),
            entry(2, Some((180, None)), &[("pessoa", "Bia")]),
            entry(3, Some((60, None)), &[("chat", "slack"), ("pessoa", "Ana")]),
        ];
        let stats = tag_breakdown(&tasks, &RunningSet::new(), 0);

        let ranked: Vec<(&str, u64)> = stats.iter().map(|s| (s.value.as_str(), s.seconds)).collect();
        assert_eq!(ranked, vec![("Bia", 180), ("Ana", 120), ("slack", 60)]);
        assert_eq!(stats[0].percentage, 60.0);
        assert_eq!(stats[1].percentage, 40.0);
        assert_eq!(stats[0].color, "#f59e0b");
        assert_eq!(stats[2].color, "#10b981");
    }

    #[test]
    fn test_breakdown_keeps_stored_color() {
        let mut task = entry(1, Some((10, None)), &[("pessoa", "Ana")]);
        task.tags[0].color = "#123456".to_string();
        let stats = tag_breakdown(&[task], &RunningSet::new(), 0);
        assert_eq!(stats[0].color, "#123456");
    }

    #[test]
    fn test_empty_day() {
        let running = RunningSet::new();
        assert_eq!(total_elapsed(&[], &running, 0), 0);
        assert!(tag_breakdown(&[], &running, 0).is_empty());
    }

    #[test]
    fn test_filter_by_type() {
        let tasks = vec![entry(1, Some((10, None)), &[("pessoa", "Ana"), ("tipo", "dev"), ("pessoa", "Bia")])];
        let stats = tag_breakdown(&tasks, &RunningSet::new(), 0);

        assert_eq!(filter_by_type(&stats, None).len(), 3);
        let people = filter_by_type(&stats, Some("pessoa"));
        assert_eq!(people.len(), 2);
        assert!(people.iter().all(|s| s.tag_type == "pessoa"));
        assert!(filter_by_type(&stats, Some("chat")).is_empty());
        assert_eq!(tag_types(&stats), vec!["pessoa", "tipo"]);
    }

    #[test]
    fn test_aggregator_tracks_clock() {
        let clock = FixedClock::at(1000);
        let tasks = vec![entry(1, Some((30, Some(1000))), &[("tipo", "dev")])];
        let running = RunningSet::from_entries(&tasks);
        let aggregator = DayAggregator::new(&running, &clock);

        assert_eq!(aggregator.summarize(day(), &tasks).total_secs, 30);
        clock.advance(45);
        let summary = aggregator.summarize(day(), &tasks);
        assert_eq!(summary.total_secs, 75);
        assert_eq!(summary.tags[0].seconds, 75);
    }

    #[test]
    fn test_summarize() {
        let clock = FixedClock::at(2000);
        let mut done = entry(1, Some((120, None)), &[("pessoa", "Ana")]);
        done.task.completed = true;
        let tasks = vec![done, entry(2, Some((30, Some(1955))), &[]), entry(3, None, &[])];
        let running = RunningSet::from_entries(&tasks);

        let summary = DayAggregator::new(&running, &clock).summarize(day(), &tasks);
        assert_eq!(summary.task_count, 3);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.running_count, 1);
        assert_eq!(summary.total_secs, 195);
        assert_eq!(summary.tags.len(), 1);
        assert_eq!(summary.tags[0].seconds, 120);
    }
}
