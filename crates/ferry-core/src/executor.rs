//! Task executor: a bounded worker pool over an in-process submission queue.
//!
//! Design intent:
//! - `submit` is cheap and non-blocking: it enqueues an erased job and
//!   returns a `Pending` handle immediately.
//! - Workers own the whole per-submission protocol: the locked
//!   cancel-check / `Running` transition, progress bracketing, racing the
//!   body against its interrupt token, terminal classification, and handing
//!   the outcome to the dispatcher.
//! - The pool is an owned instance with an explicit shutdown lifecycle, not
//!   ambient global state. Shutdown rejects new submissions and drains what
//!   was already accepted, so every accepted submission still gets its one
//!   terminal callback. Acceptance, the shutdown flag, and the workers' exit
//!   decision all live under the one queue lock: a submission observed as
//!   accepted cannot be stranded by a worker that already decided to stop.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::dispatch::ResultDispatcher;
use crate::error::{BoxError, ExecutorError};
use crate::handle::{StartDecision, TaskHandle, TaskId, TaskState, TerminalKind};
use crate::listener::{Outcome, TaskListener};
use crate::observability::ExecutorCounts;
use crate::progress::{ChannelReporter, LogReporter, ProgressEvent, ProgressReporter};
use crate::task::TaskBody;

/// Worker count sized for user-triggered operations, not batch throughput.
pub const DEFAULT_WORKERS: usize = 5;

/// Executor configuration. Only the knobs correctness needs: a pool name for
/// diagnostics, the worker count, and an optional progress sink.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub name: String,
    pub workers: usize,
    pub progress: Option<UnboundedSender<ProgressEvent>>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: "ferry".to_string(),
            workers: DEFAULT_WORKERS,
            progress: None,
        }
    }
}

impl ExecutorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Route default progress reporting to this sink. Submissions that bring
    /// their own reporter are unaffected.
    pub fn progress(mut self, sink: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(sink);
        self
    }
}

/// A submission, erased down to the future a worker drives.
type Job = BoxFuture<'static, ()>;

#[derive(Default)]
struct CountCells {
    pending: AtomicUsize,
    running: AtomicUsize,
    completed: AtomicUsize,
    cancelled: AtomicUsize,
    failed: AtomicUsize,
}

impl CountCells {
    fn snapshot(&self) -> ExecutorCounts {
        ExecutorCounts {
            pending: self.pending.load(Ordering::SeqCst),
            running: self.running.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            cancelled: self.cancelled.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Queue plus the shutdown flag, under one lock. Keeping the flag here is
/// what makes `submit`'s check-and-push atomic with respect to both
/// `request_shutdown` and the workers' empty-and-shutting-down exit check.
#[derive(Default)]
struct QueueState {
    jobs: VecDeque<Job>,
    shutting_down: bool,
}

struct Shared {
    name: String,
    queue: Mutex<QueueState>,
    notify: Notify,
    dispatcher: ResultDispatcher,
    progress: Option<UnboundedSender<ProgressEvent>>,
    counts: CountCells,
}

impl Shared {
    fn lock_queue(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Per-submission default reporter. Built on the worker, never touches
    /// the interactive context.
    fn default_reporter(&self, task: TaskId) -> Arc<dyn ProgressReporter> {
        match &self.progress {
            Some(sink) => Arc::new(ChannelReporter::new(task, sink.clone())),
            None => Arc::new(LogReporter::for_task(task)),
        }
    }
}

/// Bounded worker pool running task bodies off the interactive context.
///
/// Must be created inside a tokio runtime; workers are spawned eagerly and
/// park on the queue until submissions arrive.
pub struct TaskExecutor {
    shared: Arc<Shared>,
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl TaskExecutor {
    /// Spawn the pool. Outcomes are delivered through `dispatcher`; the
    /// application is responsible for driving the matching
    /// [`InteractiveLoop`](crate::dispatch::InteractiveLoop).
    pub fn spawn(config: ExecutorConfig, dispatcher: ResultDispatcher) -> Self {
        let shared = Arc::new(Shared {
            name: config.name,
            queue: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            dispatcher,
            progress: config.progress,
            counts: CountCells::default(),
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let workers = config.workers.max(1);
        let mut joins = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let shared = Arc::clone(&shared);
            let mut rx = shutdown_rx.clone();
            joins.push(tokio::spawn(async move {
                worker_loop(worker_id, shared, &mut rx).await;
            }));
        }

        Self {
            shared,
            shutdown_tx,
            joins,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Submit a body with the executor's default progress reporter.
    pub fn submit<B, L>(
        &self,
        label: &str,
        body: B,
        listener: L,
    ) -> Result<TaskHandle, ExecutorError>
    where
        B: TaskBody,
        L: TaskListener<B::Output>,
    {
        self.submit_with_progress(label, body, listener, None)
    }

    /// Submit a body, optionally with an externally supplied reporter.
    ///
    /// Returns immediately with a `Pending` handle; the listener later
    /// receives exactly one of `ready`/`cancelled`/`failed` on the
    /// interactive context.
    pub fn submit_with_progress<B, L>(
        &self,
        label: &str,
        body: B,
        listener: L,
        progress: Option<Arc<dyn ProgressReporter>>,
    ) -> Result<TaskHandle, ExecutorError>
    where
        B: TaskBody,
        L: TaskListener<B::Output>,
    {
        let handle = TaskHandle::new(label, body.canceller());
        let job = run_one(
            Arc::clone(&self.shared),
            handle.clone(),
            body,
            Box::new(listener),
            progress,
        )
        .boxed();

        // Check-and-push under the queue lock: once accepted here, a worker
        // cannot have already taken its empty-and-shutting-down exit.
        {
            let mut queue = self.shared.lock_queue();
            if queue.shutting_down {
                return Err(ExecutorError::ShuttingDown {
                    pool: self.shared.name.clone(),
                });
            }
            self.shared.counts.pending.fetch_add(1, Ordering::SeqCst);
            queue.jobs.push_back(job);
        }
        tracing::debug!(pool = %self.shared.name, task = %handle.id(), label, "submitted");
        self.shared.notify.notify_one();
        Ok(handle)
    }

    /// Submissions by state, cumulative for the terminal buckets.
    pub fn counts(&self) -> ExecutorCounts {
        self.shared.counts.snapshot()
    }

    /// Reject new submissions; accepted work still drains.
    pub fn request_shutdown(&self) {
        self.shared.lock_queue().shutting_down = true;
        // The watch channel only wakes parked workers; the flag above is the
        // authoritative signal, re-read under the queue lock.
        let _ = self.shutdown_tx.send(true);
        self.shared.notify.notify_waiters();
    }

    /// Shut down and wait for every worker to finish draining.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            let _ = join.await;
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    shared: Arc<Shared>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        // Drain before honoring shutdown: accepted submissions keep their
        // exactly-once delivery guarantee. The exit check holds the queue
        // lock, so it cannot interleave with a submit's check-and-push.
        let job = {
            let mut queue = shared.lock_queue();
            if queue.jobs.is_empty() && queue.shutting_down {
                break;
            }
            queue.jobs.pop_front()
        };
        match job {
            Some(job) => job.await,
            None => {
                tokio::select! {
                    _ = shutdown_rx.changed() => {}
                    () = shared.notify.notified() => {}
                }
            }
        }
    }
    tracing::debug!(pool = %shared.name, worker = worker_id, "worker stopped");
}

/// How the body left the worker.
enum Exit<V> {
    Ready(V),
    Interrupted,
    Failed(BoxError),
}

/// The per-submission execution protocol, run entirely on one worker.
async fn run_one<B: TaskBody>(
    shared: Arc<Shared>,
    handle: TaskHandle,
    body: B,
    listener: Box<dyn TaskListener<B::Output>>,
    progress: Option<Arc<dyn ProgressReporter>>,
) {
    let counts = &shared.counts;
    let interrupt = CancellationToken::new();

    // Locked check-then-start: a cancel accepted before this point suppresses
    // the body entirely.
    match handle.try_start(interrupt.clone()) {
        StartDecision::SuppressedByCancel => {
            counts.pending.fetch_sub(1, Ordering::SeqCst);
            counts.cancelled.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(pool = %shared.name, task = %handle.id(), "cancelled before start");
            shared.dispatcher.deliver(listener, Outcome::Cancelled);
            return;
        }
        StartDecision::Run => {
            counts.pending.fetch_sub(1, Ordering::SeqCst);
            counts.running.fetch_add(1, Ordering::SeqCst);
        }
    }

    let progress = progress.unwrap_or_else(|| shared.default_reporter(handle.id()));
    progress.start(handle.label());

    // Race the body against its interrupt. Biased toward the interrupt, so a
    // body that swallows the signal and produces a value in the same poll
    // still reports cancelled. A panicking body is contained here and
    // becomes a failure.
    let exit = tokio::select! {
        biased;
        () = interrupt.cancelled() => Exit::Interrupted,
        result = AssertUnwindSafe(Box::new(body).run(Arc::clone(&progress))).catch_unwind() => {
            match result {
                Ok(Ok(value)) => Exit::Ready(value),
                Ok(Err(error)) => Exit::Failed(error),
                Err(panic) => Exit::Failed(panic_message(panic).into()),
            }
        }
    };

    // Cleanup happens before the worker is released, on every exit path:
    // `finish` clears the execution context, then progress stops.
    let terminal = handle.finish(match &exit {
        Exit::Ready(_) => TerminalKind::Completed,
        Exit::Interrupted => TerminalKind::Cancelled,
        Exit::Failed(_) => TerminalKind::Failed,
    });
    progress.finish();

    counts.running.fetch_sub(1, Ordering::SeqCst);
    let outcome = match exit {
        // `finish` may have reclassified a late normal return as cancelled.
        Exit::Ready(value) if terminal == TaskState::Completed => Outcome::Ready(value),
        Exit::Ready(_) | Exit::Interrupted => Outcome::Cancelled,
        Exit::Failed(error) => Outcome::Failed(error),
    };
    match &outcome {
        Outcome::Ready(_) => {
            counts.completed.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(pool = %shared.name, task = %handle.id(), "completed");
        }
        Outcome::Cancelled => {
            counts.cancelled.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(pool = %shared.name, task = %handle.id(), "cancelled");
        }
        Outcome::Failed(error) => {
            counts.failed.fetch_add(1, Ordering::SeqCst);
            tracing::error!(pool = %shared.name, task = %handle.id(), %error, "task failed");
        }
    }

    shared.dispatcher.deliver(listener, outcome);
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("task body panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("task body panicked: {message}")
    } else {
        "task body panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    use super::*;
    use crate::cancel::Cancellable;
    use crate::dispatch::interactive_context;
    use crate::task::FutureBody;

    const WAIT: Duration = Duration::from_secs(5);

    fn executor() -> TaskExecutor {
        let (dispatcher, interactive) = interactive_context();
        tokio::spawn(interactive.run());
        TaskExecutor::spawn(ExecutorConfig::new("test-pool"), dispatcher)
    }

    /// Listener that forwards the outcome plus whether it observed the
    /// interactive context.
    fn outcome_listener<V: Send + 'static>() -> (
        impl FnOnce(Outcome<V>) + Send + 'static,
        UnboundedReceiver<(bool, Outcome<V>)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = move |outcome: Outcome<V>| {
            let _ = tx.send((ResultDispatcher::is_interactive_context(), outcome));
        };
        (listener, rx)
    }

    async fn recv<V>(rx: &mut UnboundedReceiver<(bool, Outcome<V>)>) -> (bool, Outcome<V>) {
        timeout(WAIT, rx.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn slow_body_delivers_ready_on_the_interactive_context() {
        let executor = executor();
        let (listener, mut rx) = outcome_listener();

        let handle = executor
            .submit(
                "compute",
                FutureBody::new(async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(42)
                }),
                listener,
            )
            .unwrap();

        let (on_interactive, outcome) = recv(&mut rx).await;
        assert!(on_interactive);
        assert!(matches!(outcome, Outcome::Ready(42)));
        assert_eq!(handle.state(), TaskState::Completed);
    }

    #[tokio::test]
    async fn failing_body_delivers_the_original_error() {
        let executor = executor();
        let (listener, mut rx) = outcome_listener::<i32>();

        executor
            .submit(
                "lookup",
                FutureBody::new(async { Err("not found".into()) }),
                listener,
            )
            .unwrap();

        let (on_interactive, outcome) = recv(&mut rx).await;
        assert!(on_interactive);
        match outcome {
            Outcome::Failed(error) => assert_eq!(error.to_string(), "not found"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelling_a_running_body_interrupts_it() {
        let executor = executor();
        let (listener, mut rx) = outcome_listener::<i32>();
        let started = Instant::now();

        let handle = executor
            .submit(
                "slow",
                FutureBody::new(async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(1)
                }),
                listener,
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.request_cancel());

        let (_, outcome) = recv(&mut rx).await;
        assert!(outcome.is_cancelled());
        assert_eq!(handle.state(), TaskState::Cancelled);
        // The worker let go well before the body's natural 500ms.
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    struct CountingBody {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TaskBody for CountingBody {
        type Output = u32;

        async fn run(
            self: Box<Self>,
            _progress: Arc<dyn ProgressReporter>,
        ) -> Result<u32, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }
    }

    #[tokio::test]
    async fn cancel_before_start_never_invokes_the_body() {
        let (dispatcher, interactive) = interactive_context();
        tokio::spawn(interactive.run());
        // Single worker, held busy so the victim stays queued.
        let executor = TaskExecutor::spawn(ExecutorConfig::new("narrow").workers(1), dispatcher);

        let (release_tx, release_rx) = oneshot::channel::<()>();
        let (blocker_listener, mut blocker_rx) = outcome_listener();
        executor
            .submit(
                "blocker",
                FutureBody::new(async move {
                    let _ = release_rx.await;
                    Ok(0)
                }),
                blocker_listener,
            )
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let (victim_listener, mut victim_rx) = outcome_listener();
        let victim = executor
            .submit(
                "victim",
                CountingBody {
                    calls: Arc::clone(&calls),
                },
                victim_listener,
            )
            .unwrap();

        assert!(victim.request_cancel());
        release_tx.send(()).unwrap();

        let (_, outcome) = recv(&mut victim_rx).await;
        assert!(outcome.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(victim.state(), TaskState::Cancelled);
        assert!(recv(&mut blocker_rx).await.1.is_ready());
    }

    /// Body that manages its own cancellation via a private stop token.
    struct CoopBody {
        accept: bool,
        stop: CancellationToken,
    }

    struct CoopCanceller {
        accept: bool,
        stop: CancellationToken,
    }

    impl Cancellable for CoopCanceller {
        fn cancel(&self) -> bool {
            if self.accept {
                self.stop.cancel();
            }
            self.accept
        }
    }

    #[async_trait]
    impl TaskBody for CoopBody {
        type Output = u32;

        async fn run(
            self: Box<Self>,
            _progress: Arc<dyn ProgressReporter>,
        ) -> Result<u32, BoxError> {
            self.stop.cancelled().await;
            Ok(7)
        }

        fn canceller(&self) -> Option<Arc<dyn Cancellable>> {
            Some(Arc::new(CoopCanceller {
                accept: self.accept,
                stop: self.stop.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn cooperative_body_that_accepts_reports_cancelled() {
        let executor = executor();
        let (listener, mut rx) = outcome_listener::<u32>();

        let handle = executor
            .submit(
                "coop",
                CoopBody {
                    accept: true,
                    stop: CancellationToken::new(),
                },
                listener,
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.request_cancel());

        // The body returns Ok(7) after accepting; cancellation still wins.
        let (_, outcome) = recv(&mut rx).await;
        assert!(outcome.is_cancelled());
        assert_eq!(handle.state(), TaskState::Cancelled);
    }

    #[tokio::test]
    async fn cooperative_body_that_rejects_still_completes() {
        let executor = executor();
        let (listener, mut rx) = outcome_listener::<u32>();
        let stop = CancellationToken::new();

        let handle = executor
            .submit(
                "coop",
                CoopBody {
                    accept: false,
                    stop: stop.clone(),
                },
                listener,
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.request_cancel());

        // Let the body run to its normal result.
        stop.cancel();
        let (_, outcome) = recv(&mut rx).await;
        assert!(matches!(outcome, Outcome::Ready(7)));
        assert_eq!(handle.state(), TaskState::Completed);
    }

    #[tokio::test]
    async fn cancel_after_terminal_is_a_noop_with_no_second_callback() {
        let executor = executor();
        let (listener, mut rx) = outcome_listener();

        let handle = executor
            .submit("quick", FutureBody::new(async { Ok(5) }), listener)
            .unwrap();

        assert!(recv(&mut rx).await.1.is_ready());
        assert!(!handle.request_cancel());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<String>>,
    }

    impl RecordingReporter {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: impl Into<String>) {
            self.events.lock().unwrap().push(event.into());
        }
    }

    impl ProgressReporter for RecordingReporter {
        fn start(&self, label: &str) {
            self.push(format!("start:{label}"));
        }

        fn set_fraction(&self, fraction: f64) {
            self.push(format!("fraction:{fraction}"));
        }

        fn finish(&self) {
            self.push("finish");
        }
    }

    #[tokio::test]
    async fn progress_finish_fires_even_when_the_body_fails() {
        let executor = executor();
        let (listener, mut rx) = outcome_listener::<i32>();
        let reporter = Arc::new(RecordingReporter::default());

        executor
            .submit_with_progress(
                "doomed",
                FutureBody::new(async { Err("boom".into()) }),
                listener,
                Some(reporter.clone() as Arc<dyn ProgressReporter>),
            )
            .unwrap();

        assert!(recv(&mut rx).await.1.is_failed());
        assert_eq!(reporter.events(), vec!["start:doomed", "finish"]);
    }

    struct FractionBody;

    #[async_trait]
    impl TaskBody for FractionBody {
        type Output = ();

        async fn run(
            self: Box<Self>,
            progress: Arc<dyn ProgressReporter>,
        ) -> Result<(), BoxError> {
            progress.set_fraction(0.5);
            Ok(())
        }
    }

    #[tokio::test]
    async fn progress_start_precedes_the_body() {
        let executor = executor();
        let (listener, mut rx) = outcome_listener::<()>();
        let reporter = Arc::new(RecordingReporter::default());

        executor
            .submit_with_progress(
                "stepped",
                FractionBody,
                listener,
                Some(reporter.clone() as Arc<dyn ProgressReporter>),
            )
            .unwrap();

        assert!(recv(&mut rx).await.1.is_ready());
        assert_eq!(
            reporter.events(),
            vec!["start:stepped", "fraction:0.5", "finish"]
        );
    }

    #[tokio::test]
    async fn panicking_body_becomes_a_failure_and_the_worker_survives() {
        let (dispatcher, interactive) = interactive_context();
        tokio::spawn(interactive.run());
        let executor = TaskExecutor::spawn(ExecutorConfig::new("sturdy").workers(1), dispatcher);

        let (listener, mut rx) = outcome_listener::<i32>();
        executor
            .submit(
                "explosive",
                FutureBody::new(async { panic!("kaboom") }),
                listener,
            )
            .unwrap();

        let (_, outcome) = recv(&mut rx).await;
        match outcome {
            Outcome::Failed(error) => assert!(error.to_string().contains("kaboom")),
            other => panic!("expected Failed, got {other:?}"),
        }

        // Same (sole) worker still serves the next submission.
        let (listener, mut rx) = outcome_listener();
        executor
            .submit("after", FutureBody::new(async { Ok(9) }), listener)
            .unwrap();
        assert!(matches!(recv(&mut rx).await.1, Outcome::Ready(9)));
    }

    #[tokio::test]
    async fn every_submission_gets_exactly_one_callback() {
        let executor = executor();
        let (tx, mut rx) = mpsc::unbounded_channel();

        for i in 0..8u32 {
            let tx = tx.clone();
            executor
                .submit(
                    "fanout",
                    FutureBody::new(async move { Ok(i) }),
                    move |outcome: Outcome<u32>| {
                        let _ = tx.send(outcome);
                    },
                )
                .unwrap();
        }
        drop(tx);

        let mut seen = Vec::new();
        while let Ok(Some(outcome)) = timeout(WAIT, rx.recv()).await {
            match outcome {
                Outcome::Ready(value) => seen.push(value),
                other => panic!("expected Ready, got {other:?}"),
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());

        let counts = executor.counts();
        assert_eq!(counts.completed, 8);
        assert_eq!(counts.active(), 0);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_submissions_but_drains_accepted_work() {
        let (dispatcher, interactive) = interactive_context();
        tokio::spawn(interactive.run());
        let executor = TaskExecutor::spawn(ExecutorConfig::new("closing").workers(1), dispatcher);

        let (listener, mut rx) = outcome_listener();
        executor
            .submit(
                "last",
                FutureBody::new(async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(3)
                }),
                listener,
            )
            .unwrap();

        executor.request_shutdown();
        let rejected = executor.submit(
            "late",
            FutureBody::new(async { Ok(0) }),
            |_outcome: Outcome<i32>| {},
        );
        assert!(matches!(
            rejected,
            Err(ExecutorError::ShuttingDown { pool }) if pool == "closing"
        ));

        executor.shutdown_and_join().await;
        assert!(matches!(recv(&mut rx).await.1, Outcome::Ready(3)));
    }

    #[tokio::test]
    async fn submission_racing_shutdown_is_rejected_or_delivered_never_dropped() {
        for _ in 0..200 {
            let (dispatcher, interactive) = interactive_context();
            tokio::spawn(interactive.run());
            let executor = Arc::new(TaskExecutor::spawn(
                ExecutorConfig::new("racing").workers(1),
                dispatcher,
            ));

            let closer = {
                let executor = Arc::clone(&executor);
                tokio::spawn(async move {
                    executor.request_shutdown();
                })
            };

            let (listener, mut rx) = outcome_listener();
            let submitted = executor.submit("racy", FutureBody::new(async { Ok(1) }), listener);
            closer.await.unwrap();

            // Either outcome of the race is fine; an accepted submission
            // silently vanishing is not.
            match submitted {
                Ok(_handle) => assert!(matches!(recv(&mut rx).await.1, Outcome::Ready(1))),
                Err(ExecutorError::ShuttingDown { .. }) => {}
            }
        }
    }
}
