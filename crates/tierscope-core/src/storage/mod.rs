//! Reading storage contracts and reference implementations
//!
//! The engine never owns persistence. It talks to a storage collaborator
//! through [`ReadingSink`] (append-only writes), [`ReadingStore`] (range
//! scans) and [`StatsStore`] (per-run stat keys). Readings are addressed by
//! sensor id, tier and timestamp.

pub mod memory;
pub mod pager;
pub mod queue;

pub use memory::MemoryStore;
pub use pager::scan_range;
pub use queue::{QueuedSink, StorageWorker, TierWrite, WRITE_QUEUE_CAPACITY, WriteQueue};

use alloc::vec::Vec;
use core::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::stats::{RunStats, StatKey};

/// Tier holding every raw (filtered) reading
pub const RAW_TIER: u32 = 0;

/// A single timestamped sensor value
///
/// Readings within one stream arrive in non-decreasing timestamp order.
/// Duplicate timestamps are allowed and kept.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    /// Milliseconds since epoch (or since boot)
    pub timestamp: i64,
    pub value: f64,
}

impl Reading {
    pub const fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[Reading] t: {} ms, value: {:.3}", self.timestamp, self.value)
    }
}

/// Inclusive time range in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    /// Create a range, swapping the bounds if they arrive inverted
    pub const fn new(start: i64, end: i64) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Width of the range in milliseconds
    pub const fn width(&self) -> i64 {
        self.end - self.start
    }

    pub const fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// True when `other` lies entirely inside this range
    pub const fn covers(&self, other: &TimeRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Failures reported by a storage collaborator
///
/// The engine never retries these; they are surfaced to the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("Write rejected by store")]
    WriteFailed,
    #[error("Range query failed")]
    ReadFailed,
    #[error("Store unavailable")]
    Unavailable,
    #[error("Write queue is full")]
    QueueFull,
}

/// Append-only destination for tier readings
pub trait ReadingSink {
    /// Append `reading` to the end of the (sensor, tier) sequence
    fn append_reading(
        &mut self,
        sensor_id: &str,
        tier: u32,
        reading: Reading,
    ) -> Result<(), StoreError>;
}

/// Range-queryable reading storage
pub trait ReadingStore: ReadingSink {
    /// Return at most `max_count` readings with timestamps inside `range`,
    /// ordered by timestamp
    fn query_range(
        &self,
        sensor_id: &str,
        tier: u32,
        range: TimeRange,
        max_count: usize,
    ) -> Result<Vec<Reading>, StoreError>;
}

/// Per-run stat persistence
pub trait StatsStore {
    /// Stats recorded for a run, or `None` if the run was never finalized
    fn stats(&self, run_id: &str, sensor_id: &str) -> Result<Option<RunStats>, StoreError>;

    fn set_stat(
        &mut self,
        run_id: &str,
        sensor_id: &str,
        key: StatKey,
        value: f64,
    ) -> Result<(), StoreError>;
}

impl<T: ReadingSink + ?Sized> ReadingSink for &mut T {
    fn append_reading(
        &mut self,
        sensor_id: &str,
        tier: u32,
        reading: Reading,
    ) -> Result<(), StoreError> {
        (**self).append_reading(sensor_id, tier, reading)
    }
}
