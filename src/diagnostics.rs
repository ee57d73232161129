//! Diagnostic reporting for failures caught at operation boundaries.

use crate::error::TokenError;
use tracing::warn;

/// Receives every failure caught inside token and CSRF operations.
///
/// Implementations must not panic; a failed report is dropped.
pub trait DiagnosticSink: Send + Sync {
    /// Report a failure with the call site that caught it.
    fn report(&self, context: &str, error: &TokenError);
}

/// Forwards diagnostics to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, context: &str, error: &TokenError) {
        warn!(
            context = %context,
            code = %error.code(),
            error = %error,
            "Token operation failed"
        );
    }
}

/// Discards all diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _context: &str, _error: &TokenError) {}
}
