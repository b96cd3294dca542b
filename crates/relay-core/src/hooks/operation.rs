//! The `HookParams -> HookParams` signature shared by every hook.

use crate::domain::HookParams;
use crate::error::OperationError;

/// A hook's own operation.
///
/// Implemented for any `Fn(HookParams) -> Result<HookParams, OperationError>`.
/// Use [`infallible`] to wrap a closure that cannot fail, [`fallible`] for
/// one that can.
pub trait Operation: Send + Sync {
    fn apply(&self, params: HookParams) -> Result<HookParams, OperationError>;
}

impl<F> Operation for F
where
    F: Fn(HookParams) -> Result<HookParams, OperationError> + Send + Sync,
{
    fn apply(&self, params: HookParams) -> Result<HookParams, OperationError> {
        self(params)
    }
}

/// Pin down the closure signature so argument and error types are inferred.
pub fn fallible<F>(f: F) -> F
where
    F: Fn(HookParams) -> Result<HookParams, OperationError> + Send + Sync,
{
    f
}

/// Lift a closure that always succeeds.
pub fn infallible<F>(f: F) -> impl Operation
where
    F: Fn(HookParams) -> HookParams + Send + Sync,
{
    move |params: HookParams| -> Result<HookParams, OperationError> { Ok(f(params)) }
}

/// Returns params unchanged. Handy for hooks that only group children.
pub fn passthrough() -> impl Operation {
    infallible(|params| params)
}
