//! Global admission gate for screen downloads

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{Error, Result};

/// Bounds how many screen downloads run at once across the whole run
///
/// Permits are granted in request order. Backpressure only: nothing is retried here.
#[derive(Clone, Debug)]
pub struct DownloadScheduler {
    /// Semaphore to limit concurrent screen downloads
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl DownloadScheduler {
    /// Gate admitting at most `capacity` tasks at once (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot; the slot is released when the permit is dropped
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::Other("download scheduler closed".to_string()))
    }

    /// Maximum number of tasks admitted at once
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
