use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::models::{Tag, NewTag, Timer};

/// Task logged on a calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub uuid: String,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub day: NaiveDate,
    pub completed: bool,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Task {
    /// Create a new task
    pub fn new(user_id: i64, title: String, day: NaiveDate) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            uuid: uuid::Uuid::new_v4().to_string(),
            user_id,
            title,
            description: None,
            day,
            completed: false,
            created_ts: now,
            modified_ts: now,
        }
    }
}

/// Task together with its timer (zero or one) and tags, as consumed by the
/// day summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub task: Task,
    pub timer: Option<Timer>,
    pub tags: Vec<Tag>,
}

impl TaskEntry {
    pub fn id(&self) -> i64 {
        self.task.id.unwrap_or_default()
    }

    pub fn timer_id(&self) -> Option<i64> {
        self.timer.as_ref().and_then(|timer| timer.id)
    }
}

/// Fields for a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub day: Option<NaiveDate>,
    pub tags: Vec<NewTag>,
}

/// Partial update; `None` leaves a field unchanged.
/// `tags: Some(vec![])` removes every tag.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub tags: Option<Vec<NewTag>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.tags.is_none()
    }
}
