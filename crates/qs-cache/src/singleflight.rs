//! Duplicate-call suppression for concurrent loads.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Collapses concurrent calls sharing a key into one execution.
///
/// Every caller that joins while a load is in flight receives a clone of the
/// same result. Once the load finishes the key is released, so the next call
/// starts a fresh load. Deduplication is per process.
pub struct SingleFlight<R> {
    calls: Mutex<HashMap<String, Arc<OnceCell<R>>>>,
}

impl<R> Default for SingleFlight<R> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<R> std::fmt::Debug for SingleFlight<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.calls.lock().len())
            .finish()
    }
}

impl<R: Clone> SingleFlight<R> {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `load` unless a load for `key` is already in flight, in which
    /// case its result is awaited and shared.
    pub async fn run<F, Fut>(&self, key: &str, load: F) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        let cell = {
            let mut calls = self.calls.lock();
            calls
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell.get_or_init(load).await.clone();

        let mut calls = self.calls.lock();
        if calls.get(key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            calls.remove(key);
        }

        result
    }

    /// Number of keys with a load in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}
