//! Demo wiring for the ferry engine: submit a few IDE-flavored background
//! operations (exercise download, course lookup, course refresh), watch
//! progress, cancel one mid-flight, and print the terminal outcomes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferry_core::{
    BoxError, ExecutorConfig, FutureBody, Outcome, ProgressReporter, TaskBody, TaskExecutor,
    interactive_context, progress_channel,
};
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Simulated exercise download reporting fractional progress.
struct DownloadBody {
    parts: u32,
}

#[async_trait]
impl TaskBody for DownloadBody {
    type Output = u32;

    async fn run(
        self: Box<Self>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<u32, BoxError> {
        for part in 1..=self.parts {
            sleep(Duration::from_millis(30)).await;
            progress.set_fraction(f64::from(part) / f64::from(self.parts));
        }
        Ok(self.parts)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // (A) The interactive context: listener callbacks land here, one at a time.
    let (dispatcher, interactive) = interactive_context();
    let interactive = tokio::spawn(interactive.run());

    // (B) Progress subscriber standing in for the presentation layer.
    let (progress_tx, mut progress_rx) = progress_channel();
    let progress_view = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            println!("progress: {}", serde_json::to_string(&event).unwrap());
        }
    });

    // (C) The executor instance: owned, explicitly shut down at the end.
    let executor = TaskExecutor::spawn(
        ExecutorConfig::new("ferry-demo").progress(progress_tx),
        dispatcher,
    );

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    // (D) Three submissions: one succeeds, one fails, one gets cancelled.
    let tx = done_tx.clone();
    executor
        .submit(
            "Downloading exercises",
            DownloadBody { parts: 4 },
            move |outcome: Outcome<u32>| {
                let _ = tx.send(match outcome {
                    Outcome::Ready(parts) => format!("download: ready ({parts} parts)"),
                    Outcome::Cancelled => "download: cancelled".to_string(),
                    Outcome::Failed(error) => format!("download: failed ({error})"),
                });
            },
        )
        .expect("executor accepts submissions");

    let tx = done_tx.clone();
    executor
        .submit(
            "Looking up course",
            FutureBody::<()>::new(async { Err("course not found".into()) }),
            move |outcome: Outcome<()>| {
                let _ = tx.send(match outcome {
                    Outcome::Failed(error) => format!("lookup: failed ({error})"),
                    _ => "lookup: unexpected outcome".to_string(),
                });
            },
        )
        .expect("executor accepts submissions");

    let tx = done_tx.clone();
    let refresh = executor
        .submit(
            "Refreshing course list",
            FutureBody::new(async {
                sleep(Duration::from_secs(10)).await;
                Ok(())
            }),
            move |outcome: Outcome<()>| {
                let _ = tx.send(match outcome {
                    Outcome::Cancelled => "refresh: cancelled".to_string(),
                    _ => "refresh: unexpected outcome".to_string(),
                });
            },
        )
        .expect("executor accepts submissions");
    drop(done_tx);

    // The user changes their mind about the refresh.
    sleep(Duration::from_millis(100)).await;
    let accepted = refresh.request_cancel();
    println!("cancel refresh: accepted={accepted}");

    while let Some(line) = done_rx.recv().await {
        println!("{line}");
    }

    // (E) Teardown: counts, then an orderly shutdown.
    println!(
        "counts: {}",
        serde_json::to_string(&executor.counts()).unwrap()
    );
    executor.shutdown_and_join().await;
    // Dropping the executor closed the progress and dispatch channels; both
    // loops drain and exit on their own.
    let _ = progress_view.await;
    let _ = interactive.await;
}
