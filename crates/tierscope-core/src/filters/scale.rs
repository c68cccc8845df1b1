use crate::config::ScaleConfig;
use crate::error::{Error, Result};

/// Linear map from a source range onto a destination range
///
/// Values outside the source range are extrapolated, not clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTransform {
    source_min: f64,
    source_span: f64,
    destination_min: f64,
    destination_span: f64,
}

impl ScaleTransform {
    pub fn new(config: &ScaleConfig) -> Result<Self> {
        let source_span = config.source_max - config.source_min;
        let destination_span = config.destination_max - config.destination_min;
        if source_span == 0.0 || !source_span.is_finite() || !destination_span.is_finite() {
            return Err(Error::InvalidScale);
        }

        Ok(Self {
            source_min: config.source_min,
            source_span,
            destination_min: config.destination_min,
            destination_span,
        })
    }

    pub fn apply(&self, value: f64) -> f64 {
        self.destination_min + (value - self.source_min) * self.destination_span / self.source_span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(source: (f64, f64), destination: (f64, f64)) -> Result<ScaleTransform> {
        ScaleTransform::new(&ScaleConfig {
            source_min: source.0,
            source_max: source.1,
            destination_min: destination.0,
            destination_max: destination.1,
        })
    }

    #[test]
    fn test_maps_endpoints_and_midpoint() {
        let t = transform((0.0, 1023.0), (0.0, 5.0)).unwrap();
        assert_eq!(t.apply(0.0), 0.0);
        assert_eq!(t.apply(1023.0), 5.0);
        assert!((t.apply(511.5) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_destination() {
        let t = transform((0.0, 10.0), (100.0, 0.0)).unwrap();
        assert_eq!(t.apply(0.0), 100.0);
        assert_eq!(t.apply(10.0), 0.0);
        assert_eq!(t.apply(2.5), 75.0);
    }

    #[test]
    fn test_extrapolates_outside_source() {
        let t = transform((0.0, 10.0), (0.0, 1.0)).unwrap();
        assert_eq!(t.apply(20.0), 2.0);
    }

    #[test]
    fn test_degenerate_source_fails_fast() {
        assert_eq!(transform((3.0, 3.0), (0.0, 1.0)), Err(Error::InvalidScale));
        assert_eq!(
            transform((0.0, f64::INFINITY), (0.0, 1.0)),
            Err(Error::InvalidScale)
        );
    }
}
