//! TaskQueue: weight-ordered dispatcher.
//!
//! Heavy calls are issued first so their latency overlaps with everything
//! else; light calls are harvested first since they are expected to finish
//! soonest.

use std::sync::Arc;

use serde_json::Value;

use super::{DispatchMode, QueueConfig, Reporter, Task};
use crate::domain::{MethodCall, TaskId};
use crate::error::{QueueError, Violation};
use crate::impls::TracingWarningSink;
use crate::observability::{QueueCounts, TaskView};
use crate::ports::{Invokable, WarningSink};

/// Ordered queue of pending calls.
///
/// Invariant: tasks are kept in non-increasing weight order. A new task goes
/// right before the first task whose weight is `<=` its own, so among equal
/// weights the most recent submission comes first.
///
/// Every mutating method takes `&mut self`; share the queue behind a lock if
/// several callers need to submit concurrently.
pub struct TaskQueue<O = ()> {
    tasks: Vec<Task<O>>,
    mode: DispatchMode,
    reporter: Reporter,
    next_seq: u64,
}

impl<O> TaskQueue<O> {
    /// Queue reporting violations through [`TracingWarningSink`].
    pub fn new(config: QueueConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingWarningSink))
    }

    pub fn with_sink(config: QueueConfig, sink: Arc<dyn WarningSink>) -> Self {
        Self {
            tasks: Vec::new(),
            mode: config.mode,
            reporter: Reporter::new(sink, config.on_violation),
            next_seq: 0,
        }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Add a call. In auto mode it is issued before being queued.
    pub fn submit<F>(
        &mut self,
        target: Arc<dyn Invokable>,
        call: MethodCall,
        callback: F,
        weight: i64,
    ) -> Result<TaskId, QueueError>
    where
        F: FnOnce(Value) -> O + Send + 'static,
    {
        let mut task = Task::new(target, call, callback, weight);
        let id = task.id();
        tracing::debug!(task = %id, weight, call = %task.call(), mode = ?self.mode, "task submitted");

        if self.mode == DispatchMode::Auto && task.dispatch(&self.reporter)? {
            task.dispatch_seq = Some(self.bump_seq());
        }
        self.insert(task);
        Ok(id)
    }

    /// Like [`submit`](Self::submit), taking the raw argument list whose first
    /// element is the method selector.
    pub fn submit_raw<F>(
        &mut self,
        target: Arc<dyn Invokable>,
        raw: Vec<Value>,
        callback: F,
        weight: i64,
    ) -> Result<TaskId, QueueError>
    where
        F: FnOnce(Value) -> O + Send + 'static,
    {
        let call = MethodCall::from_raw(raw).ok_or_else(|| {
            QueueError::InvalidCall("first argument must be the method name".to_string())
        })?;
        self.submit(target, call, callback, weight)
    }

    /// Issue every undispatched call, heaviest first.
    ///
    /// Returns how many calls were issued. In auto mode this is a usage
    /// violation and nothing is dispatched.
    pub fn dispatch_all(&mut self) -> Result<usize, QueueError> {
        if self.mode == DispatchMode::Auto {
            self.reporter.report(Violation::AutoModeBatchDispatch)?;
            return Ok(0);
        }

        let mut dispatched = 0;
        for index in 0..self.tasks.len() {
            if self.tasks[index].can_collect() {
                continue;
            }
            if self.dispatch_at(index)? {
                dispatched += 1;
            }
        }
        tracing::debug!(dispatched, queued = self.tasks.len(), "batch dispatched");
        Ok(dispatched)
    }

    /// Wait for every task, lightest first, and return the callback results in
    /// that order.
    ///
    /// Tasks leave the queue as they are collected. If a call fails, the error
    /// is returned and the heavier tasks not reached yet stay queued. An
    /// undispatched task is reported while still queued, so a rejected
    /// violation leaves it in place.
    pub async fn collect_all(&mut self) -> Result<Vec<O>, QueueError> {
        let mut results = Vec::with_capacity(self.tasks.len());
        // the tail holds the lightest task
        while let Some(last) = self.tasks.len().checked_sub(1) {
            if !self.tasks[last].can_collect() {
                self.reporter
                    .report(Violation::CollectBeforeDispatch(self.tasks[last].id()))?;
                self.dispatch_at(last)?;
            }
            let Some(task) = self.tasks.pop() else {
                break;
            };
            results.push(task.collect(&self.reporter).await?);
        }
        tracing::debug!(collected = results.len(), "batch collected");
        Ok(results)
    }

    /// Weights in queue (dispatch) order.
    pub fn weights(&self) -> Vec<i64> {
        self.tasks.iter().map(Task::weight).collect()
    }

    pub fn snapshot(&self) -> Vec<TaskView> {
        self.tasks
            .iter()
            .map(|task| TaskView {
                id: task.id(),
                method: task.call().method().to_string(),
                weight: task.weight(),
                state: task.state(),
                dispatch_seq: task.dispatch_seq(),
                submitted_at: task.submitted_at(),
                dispatched_at: task.dispatched_at(),
            })
            .collect()
    }

    pub fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for task in &self.tasks {
            if task.can_collect() {
                counts.dispatched += 1;
            } else {
                counts.pending += 1;
            }
        }
        counts
    }

    fn insert(&mut self, task: Task<O>) {
        let index = self
            .tasks
            .iter()
            .position(|queued| task.weight() >= queued.weight())
            .unwrap_or(self.tasks.len());
        self.tasks.insert(index, task);
    }

    fn dispatch_at(&mut self, index: usize) -> Result<bool, QueueError> {
        let issued = self.tasks[index].dispatch(&self.reporter)?;
        if issued {
            let seq = self.bump_seq();
            self.tasks[index].dispatch_seq = Some(seq);
        }
        Ok(issued)
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl<O> std::fmt::Debug for TaskQueue<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("mode", &self.mode)
            .field("tasks", &self.tasks)
            .field("reporter", &self.reporter)
            .finish()
    }
}
