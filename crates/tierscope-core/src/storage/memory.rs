//! In-memory reading and stats store
//!
//! Ordered per (sensor, tier) sequences in RAM, plus stats blobs encoded with
//! postcard the same way a device would write them to flash. Used by the
//! simulator and tests, and as the reference for the storage contracts.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use log::{debug, error};

use super::{Reading, ReadingSink, ReadingStore, StatsStore, StoreError, TimeRange};
use crate::stats::{RunStats, StatKey};

/// A range query as seen by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    pub sensor_id: String,
    pub tier: u32,
    pub range: TimeRange,
    pub max_count: usize,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tiers: BTreeMap<(String, u32), Vec<Reading>>,
    stats: BTreeMap<(String, String), Vec<u8>>,
    /// Writes to this tier and above are rejected
    fail_writes_from_tier: Option<u32>,
    fail_reads: bool,
    queries: RefCell<Vec<QueryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All readings of one tier, in timestamp order
    pub fn tier(&self, sensor_id: &str, tier: u32) -> &[Reading] {
        self.tiers
            .get(&(sensor_id.to_string(), tier))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of non-empty tiers stored for a sensor
    pub fn tier_count(&self, sensor_id: &str) -> usize {
        self.tiers
            .iter()
            .filter(|((id, _), readings)| id == sensor_id && !readings.is_empty())
            .count()
    }

    /// Reject every write to `tier` or any tier above it
    pub fn fail_writes_from_tier(&mut self, tier: Option<u32>) {
        self.fail_writes_from_tier = tier;
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Every range query issued so far
    pub fn query_log(&self) -> Vec<QueryRecord> {
        self.queries.borrow().clone()
    }

    pub fn clear_query_log(&self) {
        self.queries.borrow_mut().clear();
    }
}

impl ReadingSink for MemoryStore {
    fn append_reading(
        &mut self,
        sensor_id: &str,
        tier: u32,
        reading: Reading,
    ) -> Result<(), StoreError> {
        if self.fail_writes_from_tier.is_some_and(|t| tier >= t) {
            error!(" Rejecting write to {} tier {}", sensor_id, tier);
            return Err(StoreError::WriteFailed);
        }

        let readings = self
            .tiers
            .entry((sensor_id.to_string(), tier))
            .or_default();

        // Keep the sequence ordered even if a caller appends out of order;
        // equal timestamps stay in arrival order.
        let at = readings.partition_point(|r| r.timestamp <= reading.timestamp);
        readings.insert(at, reading);
        Ok(())
    }
}

impl ReadingStore for MemoryStore {
    fn query_range(
        &self,
        sensor_id: &str,
        tier: u32,
        range: TimeRange,
        max_count: usize,
    ) -> Result<Vec<Reading>, StoreError> {
        self.queries.borrow_mut().push(QueryRecord {
            sensor_id: sensor_id.to_string(),
            tier,
            range,
            max_count,
        });

        if self.fail_reads {
            return Err(StoreError::ReadFailed);
        }

        let readings = self.tier(sensor_id, tier);
        let from = readings.partition_point(|r| r.timestamp < range.start);
        let to = readings.partition_point(|r| r.timestamp <= range.end);
        let page: Vec<Reading> = readings[from..to.max(from)]
            .iter()
            .take(max_count)
            .copied()
            .collect();

        debug!(
            " Query {} tier {} {} -> {} readings",
            sensor_id,
            tier,
            range,
            page.len()
        );
        Ok(page)
    }
}

impl StatsStore for MemoryStore {
    fn stats(&self, run_id: &str, sensor_id: &str) -> Result<Option<RunStats>, StoreError> {
        match self.stats.get(&(run_id.to_string(), sensor_id.to_string())) {
            Some(bytes) => RunStats::from_bytes(bytes)
                .map(Some)
                .map_err(|_| StoreError::ReadFailed),
            None => Ok(None),
        }
    }

    fn set_stat(
        &mut self,
        run_id: &str,
        sensor_id: &str,
        key: StatKey,
        value: f64,
    ) -> Result<(), StoreError> {
        let slot = self
            .stats
            .entry((run_id.to_string(), sensor_id.to_string()))
            .or_default();

        let mut stats = if slot.is_empty() {
            RunStats::new()
        } else {
            RunStats::from_bytes(slot).map_err(|_| StoreError::ReadFailed)?
        };
        stats.set(key, value);
        *slot = stats.to_bytes().map_err(|_| StoreError::WriteFailed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(readings: &[(i64, f64)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for &(t, v) in readings {
            store.append_reading("accel", 0, Reading::new(t, v)).unwrap();
        }
        store
    }

    #[test]
    fn test_query_range_is_inclusive_and_capped() {
        let store = store_with(&[(0, 0.0), (10, 1.0), (20, 2.0), (30, 3.0)]);

        let all = store
            .query_range("accel", 0, TimeRange::new(10, 30), 100)
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].timestamp, 10);
        assert_eq!(all[2].timestamp, 30);

        let capped = store
            .query_range("accel", 0, TimeRange::new(0, 30), 2)
            .unwrap();
        assert_eq!(capped, vec![Reading::new(0, 0.0), Reading::new(10, 1.0)]);
    }

    #[test]
    fn test_duplicate_timestamps_are_kept() {
        let store = store_with(&[(5, 1.0), (5, 2.0), (5, 3.0)]);
        let page = store
            .query_range("accel", 0, TimeRange::new(5, 5), 10)
            .unwrap();
        assert_eq!(page.iter().map(|r| r.value).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_unknown_sensor_is_empty() {
        let store = MemoryStore::new();
        let page = store
            .query_range("missing", 3, TimeRange::new(0, 100), 10)
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(store.query_log().len(), 1);
    }

    #[test]
    fn test_injected_failures() {
        let mut store = store_with(&[(0, 1.0)]);
        store.fail_writes_from_tier(Some(1));
        assert!(store.append_reading("accel", 0, Reading::new(1, 1.0)).is_ok());
        assert_eq!(
            store.append_reading("accel", 1, Reading::new(1, 1.0)),
            Err(StoreError::WriteFailed)
        );

        store.fail_reads(true);
        assert_eq!(
            store.query_range("accel", 0, TimeRange::new(0, 10), 10),
            Err(StoreError::ReadFailed)
        );
    }

    #[test]
    fn test_stats_round_trip_through_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.stats("run-1", "accel").unwrap(), None);

        store
            .set_stat("run-1", "accel", StatKey::TierCount, 3.0)
            .unwrap();
        store
            .set_stat("run-1", "accel", StatKey::ZoomLevelBetweenTiers, 20.0)
            .unwrap();

        let stats = store.stats("run-1", "accel").unwrap().unwrap();
        assert_eq!(stats.tier_count(), Some(3));
        assert_eq!(stats.zoom_level_between_tiers(), Some(20.0));
        assert_eq!(store.stats("run-2", "accel").unwrap(), None);
    }
}
