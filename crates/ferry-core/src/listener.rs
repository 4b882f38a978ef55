//! Listener surface: how terminal outcomes reach the consumer.
//!
//! Design intent:
//! - The listener is consumed (`self: Box<Self>`) by whichever callback
//!   fires, so "exactly one of ready/cancelled/failed, exactly once" is a
//!   compile-time property, not a runtime discipline.
//! - Callbacks are invoked only on the interactive context
//!   (see [`crate::dispatch`]).

use crate::error::BoxError;

/// Terminal outcome of one submission.
#[derive(Debug)]
pub enum Outcome<V> {
    Ready(V),
    Cancelled,
    Failed(BoxError),
}

impl<V> Outcome<V> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Receives the terminal outcome of one submission.
///
/// Exactly one of the three callbacks runs, exactly once, on the interactive
/// context. A panic inside a callback is a consumer bug and propagates to the
/// interactive context's own fault handling; the engine does not catch it.
pub trait TaskListener<V>: Send + 'static {
    /// The body returned `value` and no cancel was accepted.
    fn ready(self: Box<Self>, value: V);

    /// A cancel was accepted before or during execution.
    fn cancelled(self: Box<Self>);

    /// The body failed; `error` is the body's error, cause chain intact.
    fn failed(self: Box<Self>, error: BoxError);
}

/// Closure listeners: any `FnOnce(Outcome<V>)` works as a listener.
impl<V, F> TaskListener<V> for F
where
    F: FnOnce(Outcome<V>) + Send + 'static,
{
    fn ready(self: Box<Self>, value: V) {
        (*self)(Outcome::Ready(value));
    }

    fn cancelled(self: Box<Self>) {
        (*self)(Outcome::Cancelled);
    }

    fn failed(self: Box<Self>, error: BoxError) {
        (*self)(Outcome::Failed(error));
    }
}
