use std::collections::HashMap;
use serde::Serialize;
use crate::models::Tag;

/// Time attributed to one `(type, value)` tag within a day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagStat {
    #[serde(rename = "type")]
    pub tag_type: String,
    pub value: String,
    pub color: String,
    pub seconds: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone)]
struct Bucket {
    tag_type: String,
    value: String,
    color: String,
    seconds: u64,
}

/// Accumulates seconds per `(type, value)`, remembering first-seen order.
///
/// Two tags with the same type but different values are separate buckets.
/// The color of a bucket is the stored color of the first tag seen for it.
#[derive(Debug, Default)]
pub struct TagIndex {
    buckets: Vec<Bucket>,
    positions: HashMap<(String, String), usize>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tag: &Tag, seconds: u64) {
        let key = (tag.tag_type.clone(), tag.value.clone());
        match self.positions.get(&key) {
            Some(&position) => self.buckets[position].seconds += seconds,
            None => {
                self.positions.insert(key, self.buckets.len());
                self.buckets.push(Bucket {
                    tag_type: tag.tag_type.clone(),
                    value: tag.value.clone(),
                    color: tag.color.clone(),
                    seconds,
                });
            }
        }
    }

    /// Ranked statistics, most time first; ties keep first-seen order.
    /// Percentages are relative to `total_secs` and all zero when it is zero.
    pub fn into_stats(self, total_secs: u64) -> Vec<TagStat> {
        let mut stats: Vec<TagStat> = self.buckets
            .into_iter()
            .map(|bucket| TagStat {
                percentage: percentage_of(bucket.seconds, total_secs),
                tag_type: bucket.tag_type,
                value: bucket.value,
                color: bucket.color,
                seconds: bucket.seconds,
            })
            .collect();
        // sort_by is stable
        stats.sort_by(|a, b| b.seconds.cmp(&a.seconds));
        stats
    }
}

fn percentage_of(seconds: u64, total_secs: u64) -> f64 {
    if total_secs == 0 {
        0.0
    } else {
        100.0 * seconds as f64 / total_secs as f64
    }
}
