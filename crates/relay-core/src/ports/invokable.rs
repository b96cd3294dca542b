//! Invokable port - business object that accepts method calls.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::MethodCall;

/// Failure reported by a business object.
///
/// The queue never inspects or retries these; they reach the caller of
/// `collect` as-is.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("method `{0}` is not supported")]
    MethodNotFound(String),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A business object the queue can dispatch calls against.
///
/// `invoke` is started on a spawned Tokio task at dispatch time and awaited at
/// collect time, so implementations should not block the executor.
///
/// # 使用例
/// ```ignore
/// struct Directory;
///
/// #[async_trait]
/// impl Invokable for Directory {
///     async fn invoke(&self, call: MethodCall) -> Result<Value, InvokeError> {
///         match call.method() {
///             "Count" => Ok(json!(42)),
///             other => Err(InvokeError::MethodNotFound(other.to_string())),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Invokable: Send + Sync + 'static {
    async fn invoke(&self, call: MethodCall) -> Result<Value, InvokeError>;
}
