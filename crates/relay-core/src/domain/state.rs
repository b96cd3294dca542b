//! Task lifecycle.

use serde::{Deserialize, Serialize};

/// Task state while it sits in a queue.
///
/// State transitions:
/// - Pending -> Dispatched -> (collected)
///
/// Collecting consumes the task, so there is no "collected" variant: a task
/// whose callback has run no longer exists. The result handle is never reset
/// once dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Submitted, no call issued yet.
    Pending,

    /// Call issued, result not consumed yet.
    Dispatched,
}

impl TaskState {
    /// Can the result be consumed without a sequencing violation?
    pub fn can_collect(self) -> bool {
        matches!(self, TaskState::Dispatched)
    }
}
