//! Bounded background cache writes.

use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::warn;

/// Spawns detached cache writes, capping how many may be outstanding.
///
/// [`spawn`](Self::spawn) is best-effort: when every permit is taken the
/// write is dropped and logged. [`spawn_queued`](Self::spawn_queued) waits
/// for a permit instead and is meant for refreshes that must not be lost.
#[derive(Debug, Clone)]
pub struct BackgroundWriter {
    permits: Arc<Semaphore>,
    capacity: u32,
}

impl BackgroundWriter {
    /// Creates a writer allowing `capacity` outstanding writes (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = u32::try_from(capacity.max(1)).unwrap_or(u32::MAX);
        Self {
            permits: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
        }
    }

    /// Maximum outstanding writes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Number of writes currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.capacity().saturating_sub(self.permits.available_permits())
    }

    /// Spawns `task` on the current runtime. Returns false when it was skipped.
    pub fn spawn<F>(&self, label: &'static str, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(handle) = Handle::try_current() else {
            warn!(task = label, "No async runtime available, skipping background cache write");
            return false;
        };

        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            warn!(
                task = label,
                capacity = self.capacity,
                "Background cache writer saturated, skipping write"
            );
            return false;
        };

        handle.spawn(async move {
            task.await;
            drop(permit);
        });
        true
    }

    /// Spawns `task` once a permit frees up. Returns false only without a runtime.
    pub async fn spawn_queued<F>(&self, label: &'static str, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(handle) = Handle::try_current() else {
            warn!(task = label, "No async runtime available, skipping background cache write");
            return false;
        };

        let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
            return false;
        };

        handle.spawn(async move {
            task.await;
            drop(permit);
        });
        true
    }

    /// Waits until every spawned write has finished.
    pub async fn wait_idle(&self) {
        if let Ok(all) = self.permits.acquire_many(self.capacity).await {
            drop(all);
        }
    }
}

impl Default for BackgroundWriter {
    fn default() -> Self {
        Self::new(256)
    }
}
