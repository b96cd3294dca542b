use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A method invocation against a business object: selector + ordered arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    method: String,
    #[serde(default)]
    args: Vec<Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// Append one argument (builder style).
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Build from the raw argument list where the first element is the selector.
    ///
    /// Returns `None` if the list is empty or the first element is not a string.
    pub fn from_raw(mut raw: Vec<Value>) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        let Value::String(method) = raw.remove(0) else {
            return None;
        };
        Some(Self { method, args: raw })
    }

    /// Inverse of [`MethodCall::from_raw`].
    pub fn into_raw(self) -> Vec<Value> {
        let mut raw = Vec::with_capacity(self.args.len() + 1);
        raw.push(Value::String(self.method));
        raw.extend(self.args);
        raw
    }
}

impl fmt::Display for MethodCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.method, self.args.len())
    }
}
