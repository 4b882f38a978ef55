//! Result dispatch onto the interactive context.
//!
//! Listener callbacks must run on one designated single-threaded context,
//! never concurrently with each other, no matter which worker produced the
//! outcome. The mechanism is a single-consumer channel of boxed jobs: workers
//! send, one [`InteractiveLoop`] receives and runs them in arrival order.
//! The application owns the loop and drives it wherever its "UI thread"
//! lives, typically a dedicated spawned task or the main task.
//!
//! Exactly-once delivery needs no bookkeeping here: a listener is consumed by
//! the callback that fires, and the executor dispatches only after the
//! handle's single terminal transition.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::listener::{Outcome, TaskListener};

type DispatchJob = Box<dyn FnOnce() + Send>;

tokio::task_local! {
    /// Marker scoped around the interactive loop, so code (and tests) can ask
    /// "am I on the interactive context?".
    static INTERACTIVE_CONTEXT: ();
}

/// Create the interactive context pair: a cloneable dispatcher for producers
/// and the loop the application must drive.
pub fn interactive_context() -> (ResultDispatcher, InteractiveLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ResultDispatcher { tx }, InteractiveLoop { rx })
}

/// Sends work to the interactive context.
#[derive(Clone)]
pub struct ResultDispatcher {
    tx: UnboundedSender<DispatchJob>,
}

impl ResultDispatcher {
    /// Run `job` on the interactive context. Jobs from one sender run in the
    /// order they were dispatched; if the loop is already gone (application
    /// shutdown), the job is dropped.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
        let _ = self.tx.send(Box::new(job));
    }

    /// Marshal a terminal outcome: invokes exactly one listener callback on
    /// the interactive context.
    pub fn deliver<V: Send + 'static>(
        &self,
        listener: Box<dyn TaskListener<V>>,
        outcome: Outcome<V>,
    ) {
        self.dispatch(move || match outcome {
            Outcome::Ready(value) => listener.ready(value),
            Outcome::Cancelled => listener.cancelled(),
            Outcome::Failed(error) => listener.failed(error),
        });
    }

    /// True when called from within the interactive loop.
    pub fn is_interactive_context() -> bool {
        INTERACTIVE_CONTEXT.try_with(|_| ()).is_ok()
    }
}

/// The consuming half of the interactive context.
///
/// `run` processes jobs until every dispatcher clone has been dropped. A
/// panic inside a job is a consumer bug and unwinds out of `run`; the
/// engine neither retries nor hides it.
pub struct InteractiveLoop {
    rx: UnboundedReceiver<DispatchJob>,
}

impl InteractiveLoop {
    pub async fn run(mut self) {
        INTERACTIVE_CONTEXT
            .scope((), async move {
                while let Some(job) = self.rx.recv().await {
                    job();
                }
            })
            .await;
    }
}
