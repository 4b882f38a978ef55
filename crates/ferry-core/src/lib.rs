//! ferry-core
//!
//! Background task execution and cancellation engine: run long, possibly
//! blocking operations off the interactive thread, report progress, cancel
//! cooperatively or forcibly, and deliver exactly one terminal outcome back
//! to a single-threaded consumer.
//!
//! # Module map
//! - **task**: the `TaskBody` unit of work and the `FutureBody` adapter
//! - **handle**: per-submission state machine (`Pending -> Running ->
//!   {Completed, Cancelled, Failed}`) and `TaskId`
//! - **cancel**: two-tier cancellation (cooperative capability first,
//!   interrupt fallback second)
//! - **progress**: reporter trait, event stream, channel/log reporters
//! - **executor**: the bounded worker pool and the execution protocol
//! - **dispatch**: interactive-context marshaling of listener callbacks
//! - **listener**: terminal outcomes and the three-callback listener
//! - **observability**: counts-by-state snapshot
//! - **error**: engine errors and the `BoxError` body-failure carrier

pub mod cancel;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod handle;
pub mod listener;
pub mod observability;
pub mod progress;
pub mod task;

pub use cancel::Cancellable;
pub use dispatch::{InteractiveLoop, ResultDispatcher, interactive_context};
pub use error::{BoxError, ExecutorError};
pub use executor::{DEFAULT_WORKERS, ExecutorConfig, TaskExecutor};
pub use handle::{TaskHandle, TaskId, TaskState};
pub use listener::{Outcome, TaskListener};
pub use observability::ExecutorCounts;
pub use progress::{
    ChannelReporter, LogReporter, ProgressEvent, ProgressReporter, progress_channel,
};
pub use task::{FutureBody, TaskBody};
