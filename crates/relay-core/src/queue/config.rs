//! Queue configuration and violation handling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{QueueError, Violation};
use crate::ports::WarningSink;

/// When calls are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// `submit` only enqueues; the caller issues calls with `dispatch_all`.
    #[default]
    Manual,

    /// `submit` issues the call immediately. `dispatch_all` is a usage error.
    Auto,
}

/// What happens after a violation has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationPolicy {
    /// Report and carry on (best-effort forward progress).
    #[default]
    Warn,

    /// Report and return the violation as an error.
    Fail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub mode: DispatchMode,
    pub on_violation: ViolationPolicy,
}

impl QueueConfig {
    pub fn manual() -> Self {
        Self::default()
    }

    pub fn auto() -> Self {
        Self {
            mode: DispatchMode::Auto,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, on_violation: ViolationPolicy) -> Self {
        self.on_violation = on_violation;
        self
    }
}

/// Sends violations to the sink, then applies the policy.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn WarningSink>,
    policy: ViolationPolicy,
}

impl Reporter {
    pub fn new(sink: Arc<dyn WarningSink>, policy: ViolationPolicy) -> Self {
        Self { sink, policy }
    }

    pub fn policy(&self) -> ViolationPolicy {
        self.policy
    }

    /// `Ok(())` means the caller should continue.
    pub fn report(&self, violation: Violation) -> Result<(), QueueError> {
        self.sink.warn(&violation.to_string());
        match self.policy {
            ViolationPolicy::Warn => Ok(()),
            ViolationPolicy::Fail => Err(QueueError::Violation(violation)),
        }
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
