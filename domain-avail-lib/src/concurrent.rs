//! Fan-out/fan-in execution of per-domain lookups.
//!
//! Every item gets its own Tokio task. Results are collected by joining the
//! task handles in input order, so each output slot belongs to exactly one
//! input regardless of which task finished first. A task that panics or is
//! cancelled fills its slot through the caller's fallback.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

/// Runs one task per item and joins them all.
#[derive(Debug, Clone, Default)]
pub struct ConcurrentProcessor {
    limit: Option<Arc<Semaphore>>,
}

impl ConcurrentProcessor {
    /// Create a processor, optionally bounding in-flight tasks.
    ///
    /// `None` starts every task at once.
    pub fn new(max_concurrency: Option<usize>) -> Self {
        Self {
            limit: max_concurrency.map(|n| Arc::new(Semaphore::new(n.max(1)))),
        }
    }

    /// Spawn `task(item)` for every item and wait for all of them.
    ///
    /// Output has the same length and order as `items`.
    pub async fn run<T, O, F, Fut, E>(&self, items: &[T], task: F, on_failure: E) -> Vec<O>
    where
        T: Clone,
        F: Fn(T) -> Fut,
        Fut: Future<Output = O> + Send + 'static,
        O: Send + 'static,
        E: Fn(&T, JoinError) -> O,
    {
        let handles: Vec<_> = items
            .iter()
            .cloned()
            .map(|item| {
                let limit = self.limit.clone();
                let fut = task(item);
                tokio::spawn(async move {
                    let _permit = match limit {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    fut.await
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(items)
            .map(|(joined, item)| joined.unwrap_or_else(|e| on_failure(item, e)))
            .collect()
    }
}
