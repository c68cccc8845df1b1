//! Displayed working set for one chart

use alloc::collections::VecDeque;

use crate::storage::{Reading, TimeRange};

/// Readings currently shown for one sensor, ordered by timestamp
///
/// Loads only ever land below or above what is already held, so merging is
/// a prepend or an append in the common case.
#[derive(Debug, Clone, Default)]
pub struct ChartData {
    tier: u32,
    points: VecDeque<Reading>,
}

impl ChartData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tier the held readings came from
    pub fn tier(&self) -> u32 {
        self.tier
    }

    /// Drop every reading and switch to `tier`
    pub fn reset(&mut self, tier: u32) {
        self.points.clear();
        self.tier = tier;
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Merge an ordered batch of readings
    pub fn merge(&mut self, readings: &[Reading]) {
        let (Some(first), Some(last)) = (readings.first(), readings.last()) else {
            return;
        };

        let front = self.points.front().map(|r| r.timestamp);
        let back = self.points.back().map(|r| r.timestamp);
        match (front, back) {
            (Some(front), _) if last.timestamp < front => {
                for reading in readings.iter().rev() {
                    self.points.push_front(*reading);
                }
            }
            (_, Some(back)) if first.timestamp > back => {
                self.points.extend(readings.iter().copied());
            }
            (None, _) => self.points.extend(readings.iter().copied()),
            _ => {
                for reading in readings {
                    let at = self.points.partition_point(|r| r.timestamp <= reading.timestamp);
                    self.points.insert(at, *reading);
                }
            }
        }
    }

    /// Readings inside `range`
    pub fn points_in(&self, range: TimeRange) -> impl Iterator<Item = &Reading> + '_ {
        self.points
            .iter()
            .skip_while(move |r| r.timestamp < range.start)
            .take_while(move |r| r.timestamp <= range.end)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> + '_ {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(timestamps: &[i64]) -> Vec<Reading> {
        timestamps.iter().map(|&t| Reading::new(t, t as f64)).collect()
    }

    fn timestamps(data: &ChartData) -> Vec<i64> {
        data.iter().map(|r| r.timestamp).collect()
    }

    #[test]
    fn test_merge_prepends_and_appends() {
        let mut data = ChartData::new();
        data.merge(&readings(&[10, 20]));
        data.merge(&readings(&[30, 40]));
        data.merge(&readings(&[0, 5]));

        assert_eq!(timestamps(&data), vec![0, 5, 10, 20, 30, 40]);
    }

    #[test]
    fn test_merge_overlapping_batch_stays_ordered() {
        let mut data = ChartData::new();
        data.merge(&readings(&[10, 30]));
        data.merge(&readings(&[20, 40]));

        assert_eq!(timestamps(&data), vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_points_in_range() {
        let mut data = ChartData::new();
        data.merge(&readings(&[0, 10, 20, 30, 40]));

        let visible: Vec<i64> = data
            .points_in(TimeRange::new(10, 30))
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(visible, vec![10, 20, 30]);
    }

    #[test]
    fn test_reset_switches_tier() {
        let mut data = ChartData::new();
        data.merge(&readings(&[1, 2, 3]));

        data.reset(2);

        assert!(data.is_empty());
        assert_eq!(data.tier(), 2);
    }
}
