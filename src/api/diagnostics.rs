//! Hooks through which a [`crate::api::Client`] reports what it is doing.

use std::error::Error as StdError;

/// Receiver of client trace lines and decode failures. Both methods default to no-ops.
pub trait Diagnostics: Send + Sync {
    fn trace(&self, _message: &str) {}

    fn error(&self, _message: &str, _err: &(dyn StdError + 'static)) {}
}

/// Drops everything; what a client uses unless told otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {}

/// Forwards to the `log` facade: traces at debug level, errors at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn trace(&self, message: &str) {
        log::debug!("{}", message);
    }

    fn error(&self, message: &str, err: &(dyn StdError + 'static)) {
        log::error!("{}: {}", message, err);
    }
}
