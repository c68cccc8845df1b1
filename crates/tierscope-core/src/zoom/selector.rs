use log::debug;

use crate::error::{Error, Result};
use crate::stats::RunStats;
use crate::storage::TimeRange;

/// Distance the ideal tier must move from the current tier before switching
pub const TIER_HYSTERESIS: f64 = 0.6;

/// Outcome of one tier selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSelection {
    pub tier: u32,
    /// True when `tier` differs from the tier selected before this call
    pub changed: bool,
}

/// Picks the tier whose point density best matches the display for a
/// visible time range
///
/// ```text
/// ms_per_point   = TOTAL_DURATION / NUM_DATA_POINTS
/// tier0_points   = range_width / ms_per_point
/// ideal_tier     = ln(tier0_points / ideal_points) / ln(ZOOM_LEVEL_BETWEEN_TIERS)
/// ```
///
/// The current tier is kept while the ideal tier stays within
/// [`TIER_HYSTERESIS`] of it; otherwise the ideal tier is rounded and clamped
/// to the tiers the run actually has. Runs without zoom stats always use
/// tier 0.
#[derive(Debug, Clone)]
pub struct ZoomTierSelector {
    ideal_displayed_points: usize,
    current_tier: u32,
}

impl ZoomTierSelector {
    pub fn new(ideal_displayed_points: usize) -> Result<Self> {
        if ideal_displayed_points == 0 {
            return Err(Error::InvalidPointCount);
        }
        Ok(Self {
            ideal_displayed_points,
            current_tier: 0,
        })
    }

    pub fn current_tier(&self) -> u32 {
        self.current_tier
    }

    /// Return to tier 0, e.g. when a different run is opened
    pub fn reset(&mut self) {
        self.current_tier = 0;
    }

    /// Fractional tier for `range`, or `None` when the stats cannot support
    /// tier selection
    pub fn ideal_tier(&self, stats: &RunStats, range: TimeRange) -> Option<f64> {
        if !stats.has_zoom_stats() {
            return None;
        }
        let num_points = stats.num_data_points()?;
        let total_duration = stats.total_duration()?;
        let zoom_level = stats.zoom_level_between_tiers()?;
        if num_points == 0 || total_duration <= 0.0 || zoom_level <= 1.0 || range.width() <= 0 {
            return None;
        }

        let ms_per_point = total_duration / num_points as f64;
        let tier0_points = range.width() as f64 / ms_per_point;
        let tier0_per_displayed = tier0_points / self.ideal_displayed_points as f64;
        let ideal = libm::log(tier0_per_displayed) / libm::log(zoom_level);

        ideal.is_finite().then_some(ideal)
    }

    /// Choose the tier to query for `range`
    pub fn select_tier(&mut self, stats: Option<&RunStats>, range: TimeRange) -> TierSelection {
        let previous = self.current_tier;
        let top = stats
            .and_then(RunStats::tier_count)
            .map_or(0, |count| count.saturating_sub(1));

        let ideal = stats.and_then(|stats| self.ideal_tier(stats, range));
        let tier = match ideal {
            None => 0,
            Some(ideal) if libm::fabs(ideal - previous as f64) < TIER_HYSTERESIS => previous.min(top),
            Some(ideal) => libm::round(ideal).max(0.0).min(top as f64) as u32,
        };

        self.current_tier = tier;
        if tier != previous {
            debug!(
                " Tier {} -> {} for {} (ideal {:?})",
                previous, tier, range, ideal
            );
        }
        TierSelection {
            tier,
            changed: tier != previous,
        }
    }
}
