//! Deadline combinator for outbound calls.
//!
//! The operation and the deadline timer are polled by a single `select!`, so
//! whichever settles first is the only result ever delivered. The losing
//! branch is dropped in place, which also releases the timer.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::error::{ClientError, ClientResult};

/// Run `operation` with a hard deadline.
///
/// The operation receives a [`CancellationToken`] that is cancelled exactly
/// once, and only when the deadline wins the race. Work it spawned outside
/// its own future should watch the token and stop.
///
/// # Errors
/// Returns [`ClientError::Timeout`] when the deadline elapses first, or the
/// operation's own error when it fails before the deadline.
pub async fn execute<T, F, Fut>(operation: F, deadline: Duration) -> ClientResult<T>
where
    T: Send,
    F: FnOnce(CancellationToken) -> Fut + Send,
    Fut: Future<Output = ClientResult<T>> + Send,
{
    let token = CancellationToken::new();
    let call = operation(token.clone());

    tokio::select! {
        biased;
        result = call => result,
        () = tokio::time::sleep(deadline) => {
            token.cancel();
            let millis = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
            tracing::debug!(deadline_ms = millis, "request deadline elapsed");
            Err(ClientError::Timeout(millis))
        }
    }
}
