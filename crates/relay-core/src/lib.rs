//! relay-core
//!
//! Building blocks for issuing weighted calls against business objects and
//! for wrapping operations in hook chains.
//!
//! # モジュール構成
//! - **domain**: ids, method calls, hook params, task state
//! - **ports**: `Invokable` (business object), `WarningSink`
//! - **queue**: `TaskQueue` and `Task` (heaviest dispatched first, lightest collected first)
//! - **hooks**: `HookRegistry` (before / instead / after chains)
//! - **impls**: in-memory sinks and a scripted business object
//! - **observability**: read-only queue views
//! - **error**: error types

pub mod domain;
pub mod error;
pub mod hooks;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;

pub use domain::{HookId, HookParams, MethodCall, TaskId, TaskState};
pub use error::{HookError, OperationError, QueueError, Violation};
pub use hooks::{HookConfig, HookRegistry, Relation};
pub use ports::{InvokeError, Invokable, WarningSink};
pub use queue::{DispatchMode, QueueConfig, TaskQueue, ViolationPolicy};
