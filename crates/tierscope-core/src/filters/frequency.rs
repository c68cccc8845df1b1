//! Crossing-based frequency estimation
//!
//! Readings are kept for a trailing window of `window_millis`, plus the one
//! reading just before it so a crossing at the window's first reading is
//! still seen. A crossing is a rising transition from below the threshold to
//! at/above it, stamped with the timestamp of the reading that reached the
//! threshold; only crossings stamped inside the window count. Because the raw
//! readings are kept rather than just the crossings, changing the threshold
//! or the window re-evaluates the whole retained history immediately.
//!
//! ## Estimation rules
//!
//! - No crossing in the window: 0.
//! - One crossing: the window is taken as one period, as long as the crossing
//!   sits in the newest half of the window. An older lone crossing reports 0.
//! - Two or more crossings: every threshold edge (rising or falling) is half a
//!   cycle, and the half-cycles are spread over the span from the oldest
//!   reading inside the window to the newest one.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use log::debug;

use crate::config::FrequencyConfig;
use crate::error::{Error, Result};
use crate::storage::Reading;

#[derive(Debug, Clone)]
pub struct CrossingFrequencyFilter {
    window_millis: i64,
    threshold: f64,
    /// Multiplier from cycles per millisecond to output units
    units_per_second: f64,
    /// Readings inside the trailing window plus at most one anchor reading
    /// just before it, oldest first
    readings: VecDeque<Reading>,
}

impl CrossingFrequencyFilter {
    pub fn new(window_millis: i64, threshold: f64, units_per_second: f64) -> Result<Self> {
        if window_millis <= 0 {
            return Err(Error::InvalidWindow(window_millis));
        }

        Ok(Self {
            window_millis,
            threshold,
            units_per_second,
            readings: VecDeque::new(),
        })
    }

    pub fn from_config(config: &FrequencyConfig) -> Result<Self> {
        Self::new(
            config.window_millis,
            config.threshold,
            config.units_per_second,
        )
    }

    /// Record a reading and return the frequency estimate including it
    pub fn filter_value(&mut self, timestamp: i64, value: f64) -> f64 {
        self.readings.push_back(Reading::new(timestamp, value));
        self.prune();
        self.latest_frequency()
    }

    /// Change the crossing threshold; applies to the retained history too
    pub fn change_filter(&mut self, threshold: f64) {
        debug!(" Frequency threshold {} -> {}", self.threshold, threshold);
        self.threshold = threshold;
    }

    /// Change the trailing window width
    ///
    /// Narrowing drops readings that fall out of the new window. Widening
    /// cannot restore readings that were already dropped.
    pub fn change_window(&mut self, window_millis: i64) -> Result<()> {
        if window_millis <= 0 {
            return Err(Error::InvalidWindow(window_millis));
        }
        debug!(" Frequency window {} -> {} ms", self.window_millis, window_millis);
        self.window_millis = window_millis;
        self.prune();
        Ok(())
    }

    pub fn window_millis(&self) -> i64 {
        self.window_millis
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Frequency estimate for the retained history
    ///
    /// Pure: repeated calls without new input return the same value.
    pub fn latest_frequency(&self) -> f64 {
        let Some(now) = self.readings.back().map(|r| r.timestamp) else {
            return 0.0;
        };
        let window_start = now - self.window_millis;

        let mut edges = 0usize;
        let mut rising = 0usize;
        let mut last_crossing = 0i64;
        for (prev, cur) in self.windowed_pairs(window_start) {
            let is_high = self.is_high(cur.value);
            if self.is_high(prev.value) != is_high {
                edges += 1;
                if is_high {
                    rising += 1;
                    last_crossing = cur.timestamp;
                }
            }
        }

        match rising {
            0 => 0.0,
            1 => {
                if (now - last_crossing) * 2 > self.window_millis {
                    0.0
                } else {
                    self.units_per_second / self.window_millis as f64
                }
            }
            _ => {
                // The anchor reading before the window is not part of the span
                let oldest = self
                    .readings
                    .iter()
                    .find(|r| r.timestamp >= window_start)
                    .map_or(now, |r| r.timestamp);
                let span = now - oldest;
                if span <= 0 {
                    return 0.0;
                }
                self.units_per_second * (edges as f64 / 2.0) / span as f64
            }
        }
    }

    /// Timestamps of the crossings inside the window, oldest first
    pub fn crossings(&self) -> Vec<i64> {
        let Some(now) = self.readings.back().map(|r| r.timestamp) else {
            return Vec::new();
        };
        self.windowed_pairs(now - self.window_millis)
            .filter(|(prev, cur)| !self.is_high(prev.value) && self.is_high(cur.value))
            .map(|(_, cur)| cur.timestamp)
            .collect()
    }

    fn is_high(&self, value: f64) -> bool {
        value >= self.threshold
    }

    /// Consecutive reading pairs whose later reading is inside the window
    fn windowed_pairs(&self, window_start: i64) -> impl Iterator<Item = (&Reading, &Reading)> + '_ {
        self.readings
            .iter()
            .zip(self.readings.iter().skip(1))
            .filter(move |(_, cur)| cur.timestamp >= window_start)
    }

    /// Drop readings older than the window, keeping one anchor before it
    ///
    /// The anchor is the reading a crossing at the window's first reading is
    /// measured against.
    fn prune(&mut self) {
        let Some(now) = self.readings.back().map(|r| r.timestamp) else {
            return;
        };
        let window_start = now - self.window_millis;
        while self
            .readings
            .get(1)
            .is_some_and(|r| r.timestamp < window_start)
        {
            self.readings.pop_front();
        }
    }
}
