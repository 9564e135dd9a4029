//! Deadline helper: a timeout that also honours a cancellation token.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// How a deadline-bounded future ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deadline<T> {
    Completed(T),
    TimedOut,
    Cancelled,
}

/// Run `future` until it completes, `duration` elapses, or `cancel` fires.
///
/// Cancellation is checked first so an already-cancelled token never
/// starts work.
pub async fn with_deadline<T>(
    duration: Duration,
    cancel: &CancellationToken,
    future: impl Future<Output = T>,
) -> Deadline<T> {
    if cancel.is_cancelled() {
        return Deadline::Cancelled;
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Deadline::Cancelled,
        outcome = tokio::time::timeout(duration, future) => match outcome {
            Ok(value) => Deadline::Completed(value),
            Err(_) => Deadline::TimedOut,
        },
    }
}
