use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{Error, Result};

/// Default number of tier-k readings folded into one tier-(k+1) block
pub const DEFAULT_ZOOM_LEVEL_BETWEEN_TIERS: usize = 20;

/// Smallest supported zoom level; each block emits up to two readings, so
/// anything lower would not shrink the tier above
pub const MIN_ZOOM_LEVEL: usize = 4;

/// Largest supported zoom level (bounds the per-tier pending block)
pub const MAX_ZOOM_LEVEL: usize = 64;

/// Default on-screen point count tier selection aims for
pub const DEFAULT_IDEAL_DISPLAYED_POINTS: usize = 500;

/// Default cap on readings returned by one storage query
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RecorderConfig {
    pub zoom_level_between_tiers: usize,
    pub ideal_displayed_points: usize,
    pub page_size: usize,
    pub frequency: Option<FrequencyConfig>,
    pub scale: Option<ScaleConfig>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            zoom_level_between_tiers: DEFAULT_ZOOM_LEVEL_BETWEEN_TIERS,
            ideal_displayed_points: DEFAULT_IDEAL_DISPLAYED_POINTS,
            page_size: DEFAULT_PAGE_SIZE,
            frequency: None,
            scale: None,
        }
    }
}

impl RecorderConfig {
    /// Reject degenerate values up front rather than clamping them
    pub fn validate(&self) -> Result<()> {
        if !(MIN_ZOOM_LEVEL..=MAX_ZOOM_LEVEL).contains(&self.zoom_level_between_tiers) {
            return Err(Error::InvalidZoomLevel(self.zoom_level_between_tiers));
        }
        if self.ideal_displayed_points == 0 || self.page_size == 0 {
            return Err(Error::InvalidPointCount);
        }
        if let Some(frequency) = &self.frequency {
            if frequency.window_millis <= 0 {
                return Err(Error::InvalidWindow(frequency.window_millis));
            }
        }
        if let Some(scale) = &self.scale {
            let span = scale.source_max - scale.source_min;
            if span == 0.0 || !span.is_finite() {
                return Err(Error::InvalidScale);
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}

/// Crossing-frequency stage settings
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FrequencyConfig {
    /// Trailing window over which crossings are counted
    pub window_millis: i64,
    /// Crossing threshold, applied after any scale transform
    pub threshold: f64,
    /// 1000 reports Hz, 60000 reports RPM
    pub units_per_second: f64,
}

impl FrequencyConfig {
    pub const fn hertz(window_millis: i64, threshold: f64) -> Self {
        Self {
            window_millis,
            threshold,
            units_per_second: 1000.0,
        }
    }

    pub const fn rpm(window_millis: i64, threshold: f64) -> Self {
        Self {
            window_millis,
            threshold,
            units_per_second: 60_000.0,
        }
    }
}

/// Linear rescale from a source range onto a destination range
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ScaleConfig {
    pub source_min: f64,
    pub source_max: f64,
    pub destination_min: f64,
    pub destination_max: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RecorderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.zoom_level_between_tiers, 20);
        assert_eq!(config.ideal_displayed_points, 500);
    }

    #[test]
    fn test_zoom_level_bounds() {
        for zoom in [0, 1, 3, MAX_ZOOM_LEVEL + 1] {
            let config = RecorderConfig {
                zoom_level_between_tiers: zoom,
                ..RecorderConfig::default()
            };
            assert_eq!(config.validate(), Err(Error::InvalidZoomLevel(zoom)));
        }
    }

    #[test]
    fn test_degenerate_filters_rejected() {
        let config = RecorderConfig {
            frequency: Some(FrequencyConfig::rpm(-1, 0.0)),
            ..RecorderConfig::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidWindow(-1)));

        let config = RecorderConfig {
            scale: Some(ScaleConfig {
                source_min: 1.0,
                source_max: 1.0,
                destination_min: 0.0,
                destination_max: 1.0,
            }),
            ..RecorderConfig::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidScale));

        let config = RecorderConfig {
            ideal_displayed_points: 0,
            ..RecorderConfig::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidPointCount));
    }

    #[test]
    fn test_postcard_encoding() {
        let config = RecorderConfig {
            zoom_level_between_tiers: 10,
            frequency: Some(FrequencyConfig::hertz(1000, 0.5)),
            ..RecorderConfig::default()
        };

        let bytes = config.to_bytes().unwrap();
        assert_eq!(RecorderConfig::from_bytes(&bytes).unwrap(), config);
    }
}
