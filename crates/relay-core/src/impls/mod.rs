//! Impls - ports の実装（開発用・テスト用）
//!
//! - **TracingWarningSink**: default sink, forwards to `tracing`
//! - **RecordingWarningSink**: keeps messages in memory
//! - **ScriptedObject**: in-memory business object with scripted methods

pub mod recording_sink;
pub mod scripted_object;
pub mod tracing_sink;

pub use self::recording_sink::RecordingWarningSink;
pub use self::scripted_object::ScriptedObject;
pub use self::tracing_sink::TracingWarningSink;
