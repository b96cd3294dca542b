use thiserror::Error;

use crate::domain::{HookId, TaskId};
use crate::ports::InvokeError;

/// Error type returned by hook operations.
pub type OperationError = Box<dyn std::error::Error + Send + Sync>;

/// Usage or sequencing mistake made by the caller.
///
/// Violations are always reported to the [`WarningSink`](crate::ports::WarningSink).
/// Whether they also abort the operation is decided by
/// [`ViolationPolicy`](crate::queue::ViolationPolicy).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("batch dispatch requested while the queue runs in auto mode")]
    AutoModeBatchDispatch,

    #[error("{0} collected before it was dispatched")]
    CollectBeforeDispatch(TaskId),

    #[error("{0} dispatched more than once")]
    DuplicateDispatch(TaskId),
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Violation(#[from] Violation),

    #[error("invalid call: {0}")]
    InvalidCall(String),

    #[error("{task} `{method}` failed")]
    Invoke {
        task: TaskId,
        method: String,
        #[source]
        source: InvokeError,
    },

    #[error("{task} call did not run to completion")]
    Join {
        task: TaskId,
        #[source]
        source: tokio::task::JoinError,
    },
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("hook not found: {0}")]
    UnknownHook(HookId),

    #[error("no hook named `{0}`")]
    NoSuchName(String),

    #[error("unknown hook relation `{0}` (expected before, instead or after)")]
    UnknownRelation(String),

    #[error("hook cycle detected at `{hook}`")]
    Cycle { hook: String },

    #[error("hook chain nested deeper than {depth}")]
    DepthExceeded { depth: usize },

    #[error("hook `{hook}` failed")]
    Operation {
        hook: String,
        #[source]
        source: OperationError,
    },

    #[error("invalid hook params: {0}")]
    InvalidParams(#[from] serde_json::Error),
}
