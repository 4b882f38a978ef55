//! Cancellation protocol.
//!
//! Two-tier policy, in order of preference:
//! 1. If the body exposed its own [`Cancellable`], delegate to it and return
//!    its verdict. This is the cooperative path for bodies that can abort
//!    in-flight work cleanly (e.g. dropping an HTTP request).
//! 2. Otherwise, if the body is running, trip its interrupt token; the
//!    executor races the body against that token, so a non-cooperative body
//!    unwinds at its next await point.
//!
//! A cancel that arrives before the body starts only raises the
//! `cancel_requested` flag; the worker's pickup check observes it and never
//! invokes the body. A cancel on an already-terminal handle is a no-op.

use crate::handle::{TaskHandle, TaskState};

/// Cooperative cancellation capability a task body may expose.
///
/// `cancel` may be called from any thread while the body runs; it must be
/// fast and non-blocking (it runs under the handle lock).
pub trait Cancellable: Send + Sync {
    /// Request cancellation. Returns true when the request was accepted and
    /// the body will wind down.
    fn cancel(&self) -> bool;
}

impl TaskHandle {
    /// Request cancellation of this submission.
    ///
    /// Safe to call from any thread at any point in the lifecycle. Returns
    /// true when the request was accepted: the listener will observe
    /// `cancelled` rather than `ready`. Returns false for handles that are
    /// already terminal, or when a cooperative body rejected the request.
    ///
    /// Runs under the same lock as the `Pending -> Running` transition, so
    /// there is no window in which a cancel can slip between the worker's
    /// pickup check and the recording of the execution context.
    pub fn request_cancel(&self) -> bool {
        let mut inner = self.lock_inner();
        if inner.state.is_terminal() {
            return false;
        }

        if let Some(canceller) = inner.canceller.clone() {
            let accepted = canceller.cancel();
            if accepted {
                inner.cancel_requested = true;
            }
            return accepted;
        }

        match inner.state {
            TaskState::Running => {
                if let Some(interrupt) = &inner.interrupt {
                    interrupt.cancel();
                }
                inner.cancel_requested = true;
                true
            }
            // Not yet picked up: raising the flag is enough, the worker's
            // start-up check suppresses the body.
            TaskState::Pending => {
                inner.cancel_requested = true;
                true
            }
            _ => false,
        }
    }
}
