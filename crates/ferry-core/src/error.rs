//! Error types for the engine.
//!
//! Body failures are not modeled here: a task body fails with whatever error
//! it likes, carried unmodified as a [`BoxError`] to the listener's
//! `failed` callback. This module only covers errors raised by the engine
//! itself.

use thiserror::Error;

/// Opaque error produced by a task body.
///
/// The engine never inspects it; it is handed to the listener as-is,
/// cause chain included.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by [`TaskExecutor`](crate::executor::TaskExecutor) itself.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The executor has been asked to shut down and rejects new submissions.
    #[error("executor `{pool}` is shutting down; submission rejected")]
    ShuttingDown {
        /// Pool name, for diagnostics.
        pool: String,
    },
}
