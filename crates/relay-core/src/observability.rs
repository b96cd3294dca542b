//! Read-only views over a queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{TaskId, TaskState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub dispatched: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.pending + self.dispatched
    }
}

/// One queued task as seen from the outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: TaskId,
    pub method: String,
    pub weight: i64,
    pub state: TaskState,
    pub dispatch_seq: Option<u64>,
    pub submitted_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
}
