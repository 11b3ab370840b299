//! Concurrency-limited fan-out over routes.
//!
//! A counting semaphore with a FIFO wait queue gates how many per-route
//! futures are in flight at once; results come back keyed by input
//! position rather than completion order.

use std::future::Future;
use std::sync::Arc;

use futures::future;
use tokio::sync::Semaphore;

/// Runs `f` over every item with at most `limit` invocations in flight.
///
/// A `limit` of 0 dispatches every invocation immediately. Queued items
/// are admitted in input order as soon as a slot frees (sliding window,
/// not batches). Every invocation is driven to settlement, and the
/// returned vector matches the input order regardless of completion
/// order.
pub async fn run_limited<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<R>
where
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = R>,
{
    let gate = (limit > 0).then(|| Arc::new(Semaphore::new(limit)));

    let sessions = items.into_iter().enumerate().map(|(index, item)| {
        let gate = gate.clone();
        let f = &f;
        async move {
            // join_all polls in input order and the semaphore queue is
            // FIFO, so queued items are admitted in input order.
            let _permit = match gate.as_ref() {
                Some(gate) => gate.acquire().await.ok(),
                None => None,
            };
            f(index, item).await
        }
    });

    future::join_all(sessions).await
}
