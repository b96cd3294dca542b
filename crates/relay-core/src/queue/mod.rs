//! Queue module: weighted dispatch, reverse-weighted collection.

mod config;
mod dispatcher;
mod task;

pub use config::{DispatchMode, QueueConfig, Reporter, ViolationPolicy};
pub use dispatcher::TaskQueue;
pub use task::{Callback, Task};
