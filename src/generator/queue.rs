//! Pass-wide work queue handed to generators.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};
use uuid::Uuid;

/// Handle bounding concurrent generator work across a pass.
///
/// Cloning is cheap and every clone refers to the same queue; equality is
/// identity. A [`Coordinator`](crate::coordinator::Coordinator) creates exactly
/// one queue and puts it on every request it sends.
#[derive(Clone)]
pub struct WorkQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    id: Uuid,
    max_parallel: usize,
    permits: Semaphore,
}

impl WorkQueue {
    /// Queue allowing at most `max_parallel` (at least one) concurrent jobs.
    #[must_use]
    pub fn new(max_parallel: usize) -> Self {
        let max_parallel = max_parallel.max(1);
        Self {
            inner: Arc::new(QueueInner {
                id: Uuid::new_v4(),
                max_parallel,
                permits: Semaphore::new(max_parallel),
            }),
        }
    }

    /// Identifier for log correlation.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Configured concurrency bound.
    #[must_use]
    pub fn max_parallel(&self) -> usize {
        self.inner.max_parallel
    }

    /// Slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Wait for a slot. The slot is released when the permit is dropped.
    ///
    /// # Errors
    ///
    /// Only fails if the queue was closed, which this type never does.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, AcquireError> {
        self.inner.permits.acquire().await
    }

    /// Run `job` while holding a slot.
    pub async fn run<F, T>(&self, job: F) -> anyhow::Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let _permit = self.acquire().await?;
        job.await
    }
}

impl PartialEq for WorkQueue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for WorkQueue {}

impl fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("id", &self.inner.id)
            .field("max_parallel", &self.inner.max_parallel)
            .finish_non_exhaustive()
    }
}
