//! HookParams: the value threaded through a hook chain.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HookError;

fn enabled() -> bool {
    true
}

/// Payload plus chain-control gates.
///
/// The `before`/`instead`/`after` gates apply to whichever hook currently holds
/// the params, so a handler that flips `after` to `false` suppresses the
/// after-chain of every hook the value passes through from then on. `skip` is
/// consumed by the single hook it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookParams {
    /// Named arguments.
    #[serde(default)]
    pub args: BTreeMap<String, Value>,

    /// Skip the hook's own operation; its handler chains still run.
    #[serde(default)]
    pub skip: bool,

    #[serde(default = "enabled")]
    pub before: bool,

    #[serde(default = "enabled")]
    pub instead: bool,

    #[serde(default = "enabled")]
    pub after: bool,
}

impl Default for HookParams {
    fn default() -> Self {
        Self {
            args: BTreeMap::new(),
            skip: false,
            before: true,
            instead: true,
            after: true,
        }
    }
}

impl HookParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a record-like JSON object.
    ///
    /// Any subset of `args`, `skip`, `before`, `instead`, `after` is accepted;
    /// missing fields take their defaults, unknown fields are rejected.
    pub fn from_record(record: Value) -> Result<Self, HookError> {
        Ok(serde_json::from_value(record)?)
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Decode an argument into `T`. `Ok(None)` if absent.
    pub fn arg_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, HookError> {
        match self.args.get(name) {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }

    pub fn set_arg(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.args.insert(name.into(), value.into())
    }

    pub fn remove_arg(&mut self, name: &str) -> Option<Value> {
        self.args.remove(name)
    }
}

impl TryFrom<Value> for HookParams {
    type Error = HookError;

    fn try_from(record: Value) -> Result<Self, Self::Error> {
        Self::from_record(record)
    }
}

impl TryFrom<serde_json::Map<String, Value>> for HookParams {
    type Error = HookError;

    fn try_from(record: serde_json::Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_record(Value::Object(record))
    }
}
