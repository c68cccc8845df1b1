use core::fmt::Display;

use super::{RunStats, StatKey};

/// Cumulative statistics over the tier-0 readings of one run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunningStats {
    /// Number of readings seen
    pub count: u64,
    /// Smallest value seen (meaningless while `count == 0`)
    pub min: f64,
    /// Largest value seen (meaningless while `count == 0`)
    pub max: f64,
    /// Sum of all values, used for the mean
    pub sum: f64,
    pub first_timestamp: i64,
    pub last_timestamp: i64,
}

impl RunningStats {
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean value, or `None` before the first reading
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    /// Milliseconds between the first and last reading
    pub const fn duration(&self) -> i64 {
        self.last_timestamp - self.first_timestamp
    }

    /// Copy these values into the persisted stat keys
    ///
    /// MIN/MAX/AVERAGE are only written once a reading exists.
    pub fn write_into(&self, stats: &mut RunStats) {
        stats.set(StatKey::NumDataPoints, self.count as f64);
        stats.set(StatKey::TotalDuration, self.duration() as f64);
        if let Some(mean) = self.mean() {
            stats.set(StatKey::Min, self.min);
            stats.set(StatKey::Max, self.max);
            stats.set(StatKey::Average, mean);
        }
    }
}

impl Display for RunningStats {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.mean() {
            Some(mean) => write!(
                f,
                "[RunningStats] count: {}, min: {:.3}, max: {:.3}, avg: {:.3}, duration: {} ms",
                self.count,
                self.min,
                self.max,
                mean,
                self.duration()
            ),
            None => write!(f, "[RunningStats] empty"),
        }
    }
}

/// Online accumulator for [`RunningStats`]
///
/// Every update is O(1); nothing is ever rescanned or pruned.
#[derive(Debug, Clone, Default)]
pub struct RunningStatsAccumulator {
    stats: RunningStats,
}

impl RunningStatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one reading into the running totals
    pub fn update(&mut self, timestamp: i64, value: f64) {
        let stats = &mut self.stats;
        if stats.count == 0 {
            stats.min = value;
            stats.max = value;
            stats.first_timestamp = timestamp;
        } else {
            stats.min = stats.min.min(value);
            stats.max = stats.max.max(value);
        }
        stats.count += 1;
        stats.sum += value;
        stats.last_timestamp = timestamp;
    }

    pub fn snapshot(&self) -> RunningStats {
        self.stats
    }
}
