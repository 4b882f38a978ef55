//! Task handle: per-submission state machine.
//!
//! One [`TaskHandle`] is created per submission and shared between the
//! submitter (who holds it to request cancellation) and the executor (which
//! drives its lifecycle). All mutable state lives behind a single lock; the
//! cancellation protocol in [`crate::cancel`] takes the same lock as the
//! `Pending -> Running` transition, so a cancel issued between submission and
//! worker pickup cannot be lost.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use ulid::Ulid;

use crate::cancel::Cancellable;

/// Identifier of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Ulid);

impl TaskId {
    pub(crate) fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Lifecycle state of a submission.
///
/// Transitions:
/// - `Pending -> Running -> {Completed, Cancelled, Failed}`
/// - `Pending -> Cancelled` (cancel accepted before the body ever ran)
///
/// Exactly one terminal state is reached, exactly once; nothing transitions
/// out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// How the body left the worker; input to terminal classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TerminalKind {
    Completed,
    Cancelled,
    Failed,
}

/// Decision taken while holding the handle lock at worker pickup.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum StartDecision {
    /// No cancel pending; the handle is now `Running`.
    Run,
    /// A cancel was accepted before start; the handle is now `Cancelled`
    /// and the body must not be invoked.
    SuppressedByCancel,
}

pub(crate) struct HandleInner {
    pub(crate) state: TaskState,
    /// Monotonic: set at most once, never cleared. Once true, a late normal
    /// return from the body is reported as cancelled.
    pub(crate) cancel_requested: bool,
    /// Stand-in for the worker's execution context: present only while
    /// `Running`, cancelled to interrupt a non-cooperative body.
    pub(crate) interrupt: Option<CancellationToken>,
    /// Cooperative cancellation seam captured from the body at submission.
    pub(crate) canceller: Option<Arc<dyn Cancellable>>,
}

/// Handle to one submitted task.
///
/// Cheap to clone; all clones observe the same state.
#[derive(Clone)]
pub struct TaskHandle {
    id: TaskId,
    label: Arc<str>,
    inner: Arc<Mutex<HandleInner>>,
}

impl TaskHandle {
    pub(crate) fn new(label: &str, canceller: Option<Arc<dyn Cancellable>>) -> Self {
        Self {
            id: TaskId::generate(),
            label: Arc::from(label),
            inner: Arc::new(Mutex::new(HandleInner {
                state: TaskState::Pending,
                cancel_requested: false,
                interrupt: None,
                canceller,
            })),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Display label the submission was created with.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current lifecycle state (snapshot).
    pub fn state(&self) -> TaskState {
        self.lock_inner().state
    }

    /// Whether a cancel request has been accepted for this submission.
    pub fn cancel_requested(&self) -> bool {
        self.lock_inner().cancel_requested
    }

    /// A poisoned lock means a worker panicked mid-transition; the state it
    /// left behind is still the best answer we have, so recover the guard.
    pub(crate) fn lock_inner(&self) -> MutexGuard<'_, HandleInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Worker pickup: the check-then-run step of the execution protocol.
    ///
    /// Holds the lock across the cancel check and the `Pending -> Running`
    /// transition, recording `interrupt` as the execution context.
    pub(crate) fn try_start(&self, interrupt: CancellationToken) -> StartDecision {
        let mut inner = self.lock_inner();
        debug_assert_eq!(inner.state, TaskState::Pending);
        if inner.cancel_requested {
            inner.state = TaskState::Cancelled;
            StartDecision::SuppressedByCancel
        } else {
            inner.state = TaskState::Running;
            inner.interrupt = Some(interrupt);
            StartDecision::Run
        }
    }

    /// Worker completion: single terminal transition out of `Running`.
    ///
    /// Clears the execution context and classifies the outcome. Policy: an
    /// accepted cancel wins over a late normal return, while a body failure
    /// after an accepted cancel still reports as failed.
    pub(crate) fn finish(&self, kind: TerminalKind) -> TaskState {
        let mut inner = self.lock_inner();
        debug_assert_eq!(inner.state, TaskState::Running);
        inner.interrupt = None;
        inner.state = match kind {
            TerminalKind::Completed if inner.cancel_requested => TaskState::Cancelled,
            TerminalKind::Completed => TaskState::Completed,
            TerminalKind::Cancelled => TaskState::Cancelled,
            TerminalKind::Failed => TaskState::Failed,
        };
        inner.state
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("state", &self.state())
            .finish()
    }
}
