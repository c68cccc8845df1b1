//! FIFO write queue between the recorder and a storage worker
//!
//! The recorder can hand its tier writes to a [`QueuedSink`] instead of
//! touching storage directly. A [`StorageWorker`] on another task pulls the
//! writes off the channel in order and applies them to the real store.
//!
//! ## Usage
//!
//! ```rust,ignore
//! static WRITE_QUEUE: WriteQueue = WriteQueue::new();
//!
//! let mut sink = QueuedSink::new(&WRITE_QUEUE);
//! recorder.add_sample(&mut sink, timestamp, value)?;
//!
//! // Storage task
//! let worker = StorageWorker::new(&WRITE_QUEUE);
//! loop {
//!     worker.process_next(&mut store).await?;
//! }
//! ```

use alloc::string::{String, ToString};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, error, warn};

use super::{Reading, ReadingSink, StoreError};

/// Channel capacity for queued tier writes
///
/// One tier-0 sample produces at most two writes per tier above it, so this
/// covers bursts of several cascading samples before the worker catches up.
pub const WRITE_QUEUE_CAPACITY: usize = 64;

/// A single pending append
#[derive(Debug, Clone, PartialEq)]
pub struct TierWrite {
    pub sensor_id: String,
    pub tier: u32,
    pub reading: Reading,
}

pub type WriteQueue = Channel<CriticalSectionRawMutex, TierWrite, WRITE_QUEUE_CAPACITY>;

/// Sink that enqueues writes instead of performing them
pub struct QueuedSink<'a> {
    queue: &'a WriteQueue,
}

impl<'a> QueuedSink<'a> {
    pub fn new(queue: &'a WriteQueue) -> Self {
        Self { queue }
    }
}

impl ReadingSink for QueuedSink<'_> {
    fn append_reading(
        &mut self,
        sensor_id: &str,
        tier: u32,
        reading: Reading,
    ) -> Result<(), StoreError> {
        let write = TierWrite {
            sensor_id: sensor_id.to_string(),
            tier,
            reading,
        };
        self.queue.try_send(write).map_err(|_| {
            warn!(" Write queue full, dropping {} tier {}", sensor_id, tier);
            StoreError::QueueFull
        })
    }
}

/// Applies queued writes to a store in arrival order
pub struct StorageWorker<'a> {
    queue: &'a WriteQueue,
}

impl<'a> StorageWorker<'a> {
    pub fn new(queue: &'a WriteQueue) -> Self {
        Self { queue }
    }

    /// Wait for the next queued write and apply it
    pub async fn process_next<S: ReadingSink>(&self, store: &mut S) -> Result<(), StoreError> {
        let write = self.queue.receive().await;
        Self::apply(store, write)
    }

    /// Apply every write currently queued, stopping at the first failure
    ///
    /// Used when a recording stops: pending cascades are flushed rather than
    /// abandoned. Returns the number of writes applied.
    pub fn drain<S: ReadingSink>(&self, store: &mut S) -> Result<usize, StoreError> {
        let mut applied = 0;
        while let Ok(write) = self.queue.try_receive() {
            Self::apply(store, write)?;
            applied += 1;
        }
        if applied > 0 {
            debug!(" Drained {} queued writes", applied);
        }
        Ok(applied)
    }

    fn apply<S: ReadingSink>(store: &mut S, write: TierWrite) -> Result<(), StoreError> {
        store
            .append_reading(&write.sensor_id, write.tier, write.reading)
            .inspect_err(|e| {
                error!(
                    " Failed to apply queued write to {} tier {}: {:?}",
                    write.sensor_id, write.tier, e
                )
            })
    }
}
