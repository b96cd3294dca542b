//! ScriptedObject - 開発用の business object
//!
//! Methods are plain closures over the call arguments. A per-method latency can
//! be configured to simulate slow remote calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::MethodCall;
use crate::ports::{InvokeError, Invokable};

type MethodFn = Arc<dyn Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync>;

struct Method {
    handler: MethodFn,
    latency: Option<Duration>,
}

/// In-memory [`Invokable`].
///
/// # 使用例
/// ```ignore
/// let object = ScriptedObject::new()
///     .method("Sum", |args| Ok(json!(args.iter().filter_map(Value::as_i64).sum::<i64>())))
///     .with_latency("Sum", Duration::from_millis(20));
/// ```
#[derive(Default)]
pub struct ScriptedObject {
    methods: HashMap<String, Method>,
    calls: Mutex<Vec<MethodCall>>,
}

impl ScriptedObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a method.
    pub fn method<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.methods.insert(
            name.into(),
            Method {
                handler: Arc::new(handler),
                latency: None,
            },
        );
        self
    }

    /// Delay every call of `name` by `latency`. Unknown names are ignored.
    pub fn with_latency(mut self, name: &str, latency: Duration) -> Self {
        if let Some(method) = self.methods.get_mut(name) {
            method.latency = Some(latency);
        }
        self
    }

    /// Calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.method() == method)
            .count()
    }
}

#[async_trait]
impl Invokable for ScriptedObject {
    async fn invoke(&self, call: MethodCall) -> Result<Value, InvokeError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.clone());

        let Some(method) = self.methods.get(call.method()) else {
            return Err(InvokeError::MethodNotFound(call.method().to_string()));
        };
        if let Some(latency) = method.latency {
            tokio::time::sleep(latency).await;
        }
        (method.handler)(call.args())
    }
}
