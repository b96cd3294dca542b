//! Task: one weighted call plus the callback that consumes its result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::task::JoinHandle;

use super::Reporter;
use crate::domain::{MethodCall, TaskId, TaskState};
use crate::error::{QueueError, Violation};
use crate::ports::{InvokeError, Invokable};

/// Result-handling step, run once with the resolved value.
pub type Callback<O> = Box<dyn FnOnce(Value) -> O + Send>;

type PendingResult = JoinHandle<Result<Value, InvokeError>>;

/// A call waiting in a [`TaskQueue`](super::TaskQueue).
///
/// Design:
/// - `handle` is `None` until dispatch, then holds the spawned call. It is
///   never replaced.
/// - `collect` takes `self`, so a callback cannot run twice.
pub struct Task<O> {
    id: TaskId,
    target: Arc<dyn Invokable>,
    call: MethodCall,
    callback: Callback<O>,
    weight: i64,
    handle: Option<PendingResult>,

    pub(crate) dispatch_seq: Option<u64>,
    submitted_at: DateTime<Utc>,
    dispatched_at: Option<DateTime<Utc>>,
}

impl<O> Task<O> {
    pub fn new<F>(target: Arc<dyn Invokable>, call: MethodCall, callback: F, weight: i64) -> Self
    where
        F: FnOnce(Value) -> O + Send + 'static,
    {
        Self {
            id: TaskId::generate(),
            target,
            call,
            callback: Box::new(callback),
            weight,
            handle: None,
            dispatch_seq: None,
            submitted_at: Utc::now(),
            dispatched_at: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn call(&self) -> &MethodCall {
        &self.call
    }

    pub fn weight(&self) -> i64 {
        self.weight
    }

    pub fn state(&self) -> TaskState {
        if self.handle.is_some() {
            TaskState::Dispatched
        } else {
            TaskState::Pending
        }
    }

    /// Position in the owning queue's dispatch sequence, if dispatched there.
    pub fn dispatch_seq(&self) -> Option<u64> {
        self.dispatch_seq
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn dispatched_at(&self) -> Option<DateTime<Utc>> {
        self.dispatched_at
    }

    /// Has the call been issued?
    pub fn can_collect(&self) -> bool {
        self.state().can_collect()
    }

    /// Issue the call without waiting for it.
    ///
    /// Returns `Ok(true)` if a call was issued. Dispatching twice is a
    /// violation; when the policy lets it pass, the first call is kept and
    /// `Ok(false)` is returned. Must run inside a Tokio runtime.
    pub fn dispatch(&mut self, reporter: &Reporter) -> Result<bool, QueueError> {
        if self.handle.is_some() {
            reporter.report(Violation::DuplicateDispatch(self.id))?;
            return Ok(false);
        }
        let handle = self.start();
        self.handle = Some(handle);
        Ok(true)
    }

    /// Wait for the call and hand its value to the callback.
    ///
    /// An undispatched task is reported and, if the policy allows, dispatched
    /// on the spot so resolution can still proceed. Failures of the call itself
    /// are returned unchanged inside [`QueueError::Invoke`].
    pub async fn collect(mut self, reporter: &Reporter) -> Result<O, QueueError> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => {
                reporter.report(Violation::CollectBeforeDispatch(self.id))?;
                self.start()
            }
        };

        let outcome = handle.await.map_err(|source| QueueError::Join {
            task: self.id,
            source,
        })?;
        let value = outcome.map_err(|source| QueueError::Invoke {
            task: self.id,
            method: self.call.method().to_string(),
            source,
        })?;

        tracing::debug!(task = %self.id, weight = self.weight, "task collected");
        Ok((self.callback)(value))
    }

    fn start(&mut self) -> PendingResult {
        let target = Arc::clone(&self.target);
        let call = self.call.clone();
        self.dispatched_at = Some(Utc::now());
        tracing::debug!(task = %self.id, weight = self.weight, call = %self.call, "task dispatched");
        tokio::spawn(async move { target.invoke(call).await })
    }
}

impl<O> std::fmt::Debug for Task<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("call", &self.call)
            .field("weight", &self.weight)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
