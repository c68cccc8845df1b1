use alloc::string::String;

use log::{debug, warn};

use crate::config::{MAX_ZOOM_LEVEL, MIN_ZOOM_LEVEL};
use crate::error::{Error, Result};
use crate::stats::{RunStats, RunningStats, RunningStatsAccumulator, StatKey};
use crate::storage::{RAW_TIER, Reading, ReadingSink};

/// Highest number of tiers one run can produce, tier 0 included
///
/// The top tier is never aggregated further, so a run long enough to reach
/// it keeps appending there (about every `2^(MAX_TIERS - 1)` raw readings
/// at the lowest zoom level).
pub const MAX_TIERS: usize = 12;

/// Readings a full block hands to the tier above (its min and its max)
type Representatives = heapless::Vec<Reading, 2>;

/// Incremental multi-tier downsampler for one sensor during one run
///
/// Every reading is written to tier 0. Each tier buffers its readings in
/// blocks of `zoom_level`; a full block is reduced to its minimum and maximum
/// readings (in time order, or a single reading when they coincide) which are
/// written to the next tier and buffered there in turn.
///
/// ## Tier cascade
///
/// ```text
/// tier 0:  r r r r r r r r r r | r r r ...     (Z readings per block)
///                    |
/// tier 1:        min max | min max | ...       (Z readings per block)
///                    |
/// tier 2:           min max ...
/// ```
///
/// The cascade runs as a loop over tiers with one fixed-capacity pending
/// block per tier; nothing is heap-allocated per reading.
#[derive(Debug)]
pub struct TieredDownsampler {
    sensor_id: String,
    zoom_level: usize,
    /// Partial block per tier awaiting aggregation into the tier above
    pending: [heapless::Vec<Reading, MAX_ZOOM_LEVEL>; MAX_TIERS],
    /// Number of tiers that have received at least one reading
    tier_count: u32,
    accumulator: RunningStatsAccumulator,
    finished: bool,
}

impl TieredDownsampler {
    pub fn new(sensor_id: &str, zoom_level: usize) -> Result<Self> {
        if !(MIN_ZOOM_LEVEL..=MAX_ZOOM_LEVEL).contains(&zoom_level) {
            return Err(Error::InvalidZoomLevel(zoom_level));
        }

        Ok(Self {
            sensor_id: String::from(sensor_id),
            zoom_level,
            pending: core::array::from_fn(|_| heapless::Vec::new()),
            tier_count: 0,
            accumulator: RunningStatsAccumulator::new(),
            finished: false,
        })
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn zoom_level(&self) -> usize {
        self.zoom_level
    }

    /// Tiers written so far (0 before the first reading)
    pub fn tier_count(&self) -> u32 {
        self.tier_count
    }

    /// Live cumulative stats over the tier-0 readings written so far
    pub fn stats(&self) -> RunningStats {
        self.accumulator.snapshot()
    }

    /// Every stat key as of now, tier count included
    ///
    /// During a run this lets a displayed card pick tiers that already exist;
    /// the tier count only grows until [`finish`](Self::finish).
    pub fn run_stats(&self) -> RunStats {
        let mut stats = RunStats::new();
        self.accumulator.snapshot().write_into(&mut stats);
        stats.set(StatKey::TierCount, self.tier_count as f64);
        stats.set(StatKey::ZoomLevelBetweenTiers, self.zoom_level as f64);
        stats
    }

    /// True once the top tier has been written and no tier above can follow
    pub fn at_tier_cap(&self) -> bool {
        self.tier_count as usize >= MAX_TIERS
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Persist one filtered reading and cascade any completed blocks
    ///
    /// A failed tier-0 write leaves the run untouched. A failed write to a
    /// higher tier abandons the rest of this reading's cascade; tiers below
    /// it keep what was already written.
    pub fn record<S: ReadingSink>(&mut self, sink: &mut S, reading: Reading) -> Result<()> {
        if self.finished {
            return Err(Error::NotRecording);
        }

        self.write(sink, RAW_TIER as usize, reading)?;
        self.accumulator.update(reading.timestamp, reading.value);

        let mut incoming = Representatives::new();
        incoming
            .push(reading)
            .map_err(|_| Error::InvalidZoomLevel(self.zoom_level))?;
        self.aggregate(sink, RAW_TIER as usize, incoming)
    }

    /// Flush partial blocks and freeze the run's stats
    ///
    /// A partial block is only flushed into a tier that already exists, so a
    /// run never grows a new top tier out of leftovers. The topmost tier's
    /// own partial block is dropped.
    pub fn finish<S: ReadingSink>(&mut self, sink: &mut S) -> Result<RunStats> {
        if self.finished {
            return Err(Error::NotRecording);
        }
        self.finished = true;

        for tier in 0..MAX_TIERS - 1 {
            if tier + 1 >= self.tier_count as usize {
                break;
            }
            if self.pending[tier].is_empty() {
                continue;
            }

            let flushed = representatives(&self.pending[tier]);
            self.pending[tier].clear();
            debug!(
                " Flushing partial block of {} into tier {}",
                self.sensor_id,
                tier + 1
            );
            for reading in &flushed {
                self.write(sink, tier + 1, *reading)?;
            }
            self.aggregate(sink, tier + 1, flushed)?;
        }

        Ok(self.run_stats())
    }

    /// Buffer readings already persisted at `tier`, walking up while blocks fill
    fn aggregate<S: ReadingSink>(
        &mut self,
        sink: &mut S,
        mut tier: usize,
        mut incoming: Representatives,
    ) -> Result<()> {
        // Z >= 4 and at most two readings arrive per step, so at most one
        // block completes per tier per step.
        while tier + 1 < MAX_TIERS {
            let mut carry = Representatives::new();
            for reading in incoming {
                let block = &mut self.pending[tier];
                block
                    .push(reading)
                    .map_err(|_| Error::InvalidZoomLevel(self.zoom_level))?;
                if block.len() >= self.zoom_level {
                    carry = representatives(block);
                    block.clear();
                }
            }

            if carry.is_empty() {
                return Ok(());
            }

            tier += 1;
            for reading in &carry {
                self.write(sink, tier, *reading)?;
            }
            incoming = carry;
        }
        Ok(())
    }

    fn write<S: ReadingSink>(&mut self, sink: &mut S, tier: usize, reading: Reading) -> Result<()> {
        sink.append_reading(&self.sensor_id, tier as u32, reading)?;
        if tier as u32 >= self.tier_count {
            if tier > 0 {
                debug!(" {} reached tier {}", self.sensor_id, tier);
            }
            self.tier_count = tier as u32 + 1;
            if self.at_tier_cap() {
                warn!(
                    " {} reached the top tier {}; it will keep growing for the rest of the run",
                    self.sensor_id, tier
                );
            }
        }
        Ok(())
    }
}

/// Min and max readings of a block in time order
fn representatives(block: &[Reading]) -> Representatives {
    let mut out = Representatives::new();
    let Some(first) = block.first() else {
        return out;
    };

    let (mut min_at, mut max_at) = (0, 0);
    let (mut min, mut max) = (first.value, first.value);
    for (i, reading) in block.iter().enumerate().skip(1) {
        if reading.value < min {
            min = reading.value;
            min_at = i;
        }
        if reading.value > max {
            max = reading.value;
            max_at = i;
        }
    }

    let (lo, hi) = (min_at.min(max_at), min_at.max(max_at));
    // Capacity 2 holds both pushes
    let _ = out.push(block[lo]);
    if hi != lo {
        let _ = out.push(block[hi]);
    }
    out
}
