//! Recording side: tiered downsampling and the per-sensor run lifecycle

pub mod downsampler;
pub mod recorder;

pub use downsampler::{MAX_TIERS, TieredDownsampler};
pub use recorder::SensorRecorder;
