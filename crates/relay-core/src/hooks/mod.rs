//! Hook chains: an operation wrapped by `before`, `instead` and `after`
//! handlers, each of which is a hook itself.

mod operation;
mod registry;
mod relation;

pub use operation::{Operation, fallible, infallible, passthrough};
pub use registry::{HookConfig, HookRegistry};
pub use relation::Relation;
