//! Sink for non-fatal failures that an operator should be able to see.

use std::error::Error;

pub trait WarningSink: Send + Sync {
    fn warn(&self, message: &str, error: &dyn Error);
}

/// Forwards warnings to `tracing` at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&self, message: &str, error: &dyn Error) {
        match error.source() {
            Some(source) => tracing::warn!(error = %error, source = %source, "{message}"),
            None => tracing::warn!(error = %error, "{message}"),
        }
    }
}
