//! Progress reporting, decoupled from any concrete UI.
//!
//! Task bodies talk to a [`ProgressReporter`]; the presentation layer decides
//! what to do with the events. The built-in reporters are safe to create and
//! drive from a worker thread; nothing here touches the interactive context.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::handle::TaskId;

/// Progress sink for one submission.
///
/// The executor calls `start` before the body runs and `finish` after every
/// exit path (success, cancellation, failure); the body may call the rest.
pub trait ProgressReporter: Send + Sync {
    /// Reporting begins; `label` is the submission's display label.
    fn start(&self, label: &str);

    /// Fractional progress in `0.0..=1.0`; out-of-range values are clamped.
    fn set_fraction(&self, _fraction: f64) {}

    /// Switch (back) to indeterminate display.
    fn set_indeterminate(&self) {}

    /// Reporting ends; fires exactly once per submission.
    fn finish(&self);
}

/// Progress events published to the presentation layer.
///
/// Events carry the [`TaskId`] so one subscriber can multiplex many
/// concurrent submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { task: TaskId, label: String },
    Fraction { task: TaskId, fraction: f64 },
    Indeterminate { task: TaskId },
    Finished { task: TaskId },
}

/// Create a progress channel pair. The sender goes into
/// [`ExecutorConfig`](crate::executor::ExecutorConfig); the presentation
/// layer consumes the receiver on whatever context it likes.
pub fn progress_channel() -> (UnboundedSender<ProgressEvent>, UnboundedReceiver<ProgressEvent>) {
    mpsc::unbounded_channel()
}

/// Default reporter when the executor has a progress sink configured:
/// publishes [`ProgressEvent`]s for one submission.
pub struct ChannelReporter {
    task: TaskId,
    events: UnboundedSender<ProgressEvent>,
}

impl ChannelReporter {
    pub fn new(task: TaskId, events: UnboundedSender<ProgressEvent>) -> Self {
        Self { task, events }
    }

    fn emit(&self, event: ProgressEvent) {
        // The subscriber may be gone (presentation shut down first); progress
        // is advisory, so dropped events are fine.
        let _ = self.events.send(event);
    }
}

impl ProgressReporter for ChannelReporter {
    fn start(&self, label: &str) {
        self.emit(ProgressEvent::Started {
            task: self.task,
            label: label.to_string(),
        });
    }

    fn set_fraction(&self, fraction: f64) {
        self.emit(ProgressEvent::Fraction {
            task: self.task,
            fraction: fraction.clamp(0.0, 1.0),
        });
    }

    fn set_indeterminate(&self) {
        self.emit(ProgressEvent::Indeterminate { task: self.task });
    }

    fn finish(&self) {
        self.emit(ProgressEvent::Finished { task: self.task });
    }
}

impl fmt::Debug for ChannelReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelReporter")
            .field("task", &self.task)
            .finish()
    }
}

/// Fallback reporter when no sink is configured: progress goes to the log.
#[derive(Debug, Default)]
pub struct LogReporter {
    task: Option<TaskId>,
}

impl LogReporter {
    pub(crate) fn for_task(task: TaskId) -> Self {
        Self { task: Some(task) }
    }
}

impl ProgressReporter for LogReporter {
    fn start(&self, label: &str) {
        tracing::debug!(task = ?self.task, label, "progress started");
    }

    fn set_fraction(&self, fraction: f64) {
        tracing::trace!(task = ?self.task, fraction, "progress");
    }

    fn set_indeterminate(&self) {
        tracing::trace!(task = ?self.task, "progress indeterminate");
    }

    fn finish(&self) {
        tracing::debug!(task = ?self.task, "progress finished");
    }
}
