//! Run statistics: stat keys, the persisted per-run record, and the online
//! accumulator that feeds it

pub mod accumulator;

pub use accumulator::{RunningStats, RunningStatsAccumulator};

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::Result;

/// Keys under which run stats are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKey {
    /// Number of tier-0 readings written during the run
    NumDataPoints,
    /// Milliseconds between the first and last tier-0 reading
    TotalDuration,
    Min,
    Max,
    Average,
    /// Number of tiers holding data, tier 0 included
    TierCount,
    /// Readings of tier k folded into one block of tier k+1
    ZoomLevelBetweenTiers,
}

impl StatKey {
    pub const ALL: [StatKey; 7] = [
        Self::NumDataPoints,
        Self::TotalDuration,
        Self::Min,
        Self::Max,
        Self::Average,
        Self::TierCount,
        Self::ZoomLevelBetweenTiers,
    ];

    /// Storage key name
    pub const fn name(self) -> &'static str {
        match self {
            Self::NumDataPoints => "NUM_DATA_POINTS",
            Self::TotalDuration => "TOTAL_DURATION",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Average => "AVERAGE",
            Self::TierCount => "TIER_COUNT",
            Self::ZoomLevelBetweenTiers => "ZOOM_LEVEL_BETWEEN_TIERS",
        }
    }
}

/// Stats recorded for one (run, sensor) pair
///
/// Legacy runs may carry only a subset of keys; readers must treat every
/// key as optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    values: BTreeMap<StatKey, f64>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: StatKey) -> Option<f64> {
        self.values.get(&key).copied()
    }

    pub fn set(&mut self, key: StatKey, value: f64) {
        self.values.insert(key, value);
    }

    pub fn contains(&self, key: StatKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Iterate over the stored keys in key order
    pub fn iter(&self) -> impl Iterator<Item = (StatKey, f64)> + '_ {
        self.values.iter().map(|(key, value)| (*key, *value))
    }

    pub fn num_data_points(&self) -> Option<u64> {
        self.get(StatKey::NumDataPoints).map(|v| v as u64)
    }

    pub fn total_duration(&self) -> Option<f64> {
        self.get(StatKey::TotalDuration)
    }

    pub fn tier_count(&self) -> Option<u32> {
        self.get(StatKey::TierCount).map(|v| v as u32)
    }

    pub fn zoom_level_between_tiers(&self) -> Option<f64> {
        self.get(StatKey::ZoomLevelBetweenTiers)
    }

    /// True when the record carries everything tier selection needs
    pub fn has_zoom_stats(&self) -> bool {
        self.contains(StatKey::NumDataPoints)
            && self.contains(StatKey::TotalDuration)
            && self.contains(StatKey::TierCount)
            && self.contains(StatKey::ZoomLevelBetweenTiers)
    }

    /// Encode for blob storage
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}

impl Display for RunStats {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[RunStats]")?;
        for (key, value) in self.iter() {
            write!(f, " {}: {:.3}", key.name(), value)?;
        }
        Ok(())
    }
}
