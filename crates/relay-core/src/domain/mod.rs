//! Domain model (ids, calls, hook params, task state).

pub mod call;
pub mod ids;
pub mod params;
pub mod state;

pub use call::MethodCall;
pub use ids::{HookId, TaskId};
pub use params::HookParams;
pub use state::TaskState;
