use crate::ports::WarningSink;

/// Emits every warning as a `tracing` event at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWarningSink;

impl WarningSink for TracingWarningSink {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "relay", "{message}");
    }
}
