//! WarningSink port - non-fatal diagnostics.

/// Reporting channel for usage and sequencing violations.
///
/// Implementations must not panic or block; reporting never changes the
/// control flow of the caller.
pub trait WarningSink: Send + Sync {
    fn warn(&self, message: &str);
}
