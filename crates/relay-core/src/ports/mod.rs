//! Ports - 外部コラボレータの抽象化
//!
//! The queue and the hook chain only see these traits; the business object
//! and the warning channel are supplied by the host application.

pub mod invokable;
pub mod warning_sink;

pub use self::invokable::{InvokeError, Invokable};
pub use self::warning_sink::WarningSink;
