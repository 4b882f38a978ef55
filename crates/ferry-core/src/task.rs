//! Task bodies: the units of work submitted for background execution.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::cancel::Cancellable;
use crate::error::BoxError;
use crate::progress::ProgressReporter;

/// A unit of work run on a pool worker.
///
/// The body may block-by-awaiting as long as it likes (network, disk); that
/// is the point of offloading it. A body without a [`Cancellable`] is
/// interrupted by dropping its future at the next await point when a cancel
/// is accepted, so plain bodies need no cancellation code at all. Bodies that
/// want to abort in-flight work cleanly return a canceller from
/// [`canceller`](TaskBody::canceller); it is captured once at submission.
#[async_trait]
pub trait TaskBody: Send + 'static {
    type Output: Send + 'static;

    /// Execute the work. `progress` is already started: report fractions or
    /// leave it indeterminate, the executor finishes it on every exit path.
    async fn run(self: Box<Self>, progress: Arc<dyn ProgressReporter>)
    -> Result<Self::Output, BoxError>;

    /// Cooperative cancellation seam; `None` opts into interrupt-based
    /// cancellation.
    fn canceller(&self) -> Option<Arc<dyn Cancellable>> {
        None
    }
}

/// Adapter for ad-hoc bodies: wraps any future into a [`TaskBody`] that
/// ignores progress and has no cooperative canceller.
pub struct FutureBody<V>(BoxFuture<'static, Result<V, BoxError>>);

impl<V> FutureBody<V> {
    pub fn new(
        future: impl Future<Output = Result<V, BoxError>> + Send + 'static,
    ) -> Self {
        Self(Box::pin(future))
    }
}

#[async_trait]
impl<V: Send + 'static> TaskBody for FutureBody<V> {
    type Output = V;

    async fn run(
        self: Box<Self>,
        _progress: Arc<dyn ProgressReporter>,
    ) -> Result<V, BoxError> {
        self.0.await
    }
}
