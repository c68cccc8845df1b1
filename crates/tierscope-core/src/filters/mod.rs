//! Value filters applied to raw samples before they are recorded
//!
//! A [`FilterPipeline`] chains at most one scale transform followed by at most
//! one crossing-frequency estimator. With no stage configured it passes
//! values through unchanged.

pub mod frequency;
pub mod scale;

pub use frequency::CrossingFrequencyFilter;
pub use scale::ScaleTransform;

use log::warn;

use crate::config::RecorderConfig;
use crate::error::Result;

/// Maximum number of chained stages (scale, then frequency)
pub const MAX_FILTER_STAGES: usize = 2;

/// One stage of a filter pipeline
#[derive(Debug, Clone)]
pub enum ValueFilter {
    /// Time-independent linear rescale
    Scale(ScaleTransform),
    /// Crossing-based frequency estimate over a trailing window
    Frequency(CrossingFrequencyFilter),
}

impl ValueFilter {
    pub fn filter_value(&mut self, timestamp: i64, value: f64) -> f64 {
        match self {
            Self::Scale(transform) => transform.apply(value),
            Self::Frequency(filter) => filter.filter_value(timestamp, value),
        }
    }
}

/// Ordered chain of value filters
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    stages: heapless::Vec<ValueFilter, MAX_FILTER_STAGES>,
}

impl FilterPipeline {
    /// Pipeline that returns every value unchanged
    pub fn identity() -> Self {
        Self::default()
    }

    /// Build the pipeline described by `config`: scale first, then frequency
    pub fn from_config(config: &RecorderConfig) -> Result<Self> {
        let mut pipeline = Self::identity();
        if let Some(scale) = &config.scale {
            pipeline.push(ValueFilter::Scale(ScaleTransform::new(scale)?));
        }
        if let Some(frequency) = &config.frequency {
            pipeline.push(ValueFilter::Frequency(CrossingFrequencyFilter::from_config(
                frequency,
            )?));
        }
        Ok(pipeline)
    }

    pub fn with_scale(mut self, transform: ScaleTransform) -> Self {
        self.push(ValueFilter::Scale(transform));
        self
    }

    pub fn with_frequency(mut self, filter: CrossingFrequencyFilter) -> Self {
        self.push(ValueFilter::Frequency(filter));
        self
    }

    fn push(&mut self, stage: ValueFilter) {
        // Keep the scale stage ahead of the frequency stage
        let at = match stage {
            ValueFilter::Scale(_) => 0,
            _ => self.stages.len(),
        };
        if let Some(existing) = self.stages.iter_mut().find(|s| same_kind(s, &stage)) {
            *existing = stage;
        } else if self.stages.insert(at, stage).is_err() {
            warn!(" Filter pipeline full, ignoring stage");
        }
    }

    pub fn filter_value(&mut self, timestamp: i64, value: f64) -> f64 {
        self.stages
            .iter_mut()
            .fold(value, |v, stage| stage.filter_value(timestamp, v))
    }

    /// True when no stage is configured and values pass through unchanged
    pub fn is_identity(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn frequency(&self) -> Option<&CrossingFrequencyFilter> {
        self.stages.iter().find_map(|stage| match stage {
            ValueFilter::Frequency(filter) => Some(filter),
            _ => None,
        })
    }

    /// The frequency stage, for reconfiguring threshold or window mid-run
    pub fn frequency_mut(&mut self) -> Option<&mut CrossingFrequencyFilter> {
        self.stages.iter_mut().find_map(|stage| match stage {
            ValueFilter::Frequency(filter) => Some(filter),
            _ => None,
        })
    }
}

fn same_kind(a: &ValueFilter, b: &ValueFilter) -> bool {
    core::mem::discriminant(a) == core::mem::discriminant(b)
}
