use alloc::string::String;

use log::{error, info};

use super::TieredDownsampler;
use crate::config::RecorderConfig;
use crate::error::{Error, Result};
use crate::filters::FilterPipeline;
use crate::stats::{RunStats, RunningStats};
use crate::storage::{Reading, ReadingSink, StatsStore};

/// State of one run in progress
#[derive(Debug)]
struct ActiveRun {
    run_id: String,
    pipeline: FilterPipeline,
    downsampler: TieredDownsampler,
}

#[derive(Debug)]
enum RecorderState {
    Idle,
    Recording(ActiveRun),
}

/// Recording lifecycle for a single sensor stream
///
/// Each `start_recording` builds a fresh filter pipeline, downsampler and
/// stats accumulator from the config, so no state leaks between runs.
#[derive(Debug)]
pub struct SensorRecorder {
    sensor_id: String,
    config: RecorderConfig,
    state: RecorderState,
}

impl SensorRecorder {
    pub fn new(sensor_id: &str, config: RecorderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sensor_id: String::from(sensor_id),
            config,
            state: RecorderState::Idle,
        })
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording(_))
    }

    pub fn run_id(&self) -> Option<&str> {
        self.active().map(|run| run.run_id.as_str())
    }

    pub fn start_recording(&mut self, run_id: &str) -> Result<()> {
        if self.is_recording() {
            return Err(Error::AlreadyRecording);
        }

        let pipeline = FilterPipeline::from_config(&self.config)?;
        let downsampler = TieredDownsampler::new(&self.sensor_id, self.config.zoom_level_between_tiers)?;
        self.state = RecorderState::Recording(ActiveRun {
            run_id: String::from(run_id),
            pipeline,
            downsampler,
        });

        info!(" Recording {} started (run {})", self.sensor_id, run_id);
        Ok(())
    }

    /// Filter one raw sample and record the result
    ///
    /// Returns the filtered value that was written to tier 0.
    pub fn add_sample<S: ReadingSink>(
        &mut self,
        sink: &mut S,
        timestamp: i64,
        raw_value: f64,
    ) -> Result<f64> {
        let run = self.active_mut().ok_or(Error::NotRecording)?;
        let value = run.pipeline.filter_value(timestamp, raw_value);
        run.downsampler.record(sink, Reading::new(timestamp, value))?;
        Ok(value)
    }

    /// End the run: flush the downsampler and persist every stat key
    ///
    /// The recorder returns to idle even when a write fails, since the run
    /// cannot be resumed.
    pub fn stop_recording<S, T>(&mut self, sink: &mut S, stats_store: &mut T) -> Result<RunStats>
    where
        S: ReadingSink,
        T: StatsStore + ?Sized,
    {
        let RecorderState::Recording(mut run) =
            core::mem::replace(&mut self.state, RecorderState::Idle)
        else {
            return Err(Error::NotRecording);
        };

        let stats = run.downsampler.finish(sink).inspect_err(|e| {
            error!(" Failed to flush tiers for {}: {:?}", self.sensor_id, e)
        })?;

        for (key, value) in stats.iter() {
            stats_store
                .set_stat(&run.run_id, &self.sensor_id, key, value)
                .inspect_err(|e| {
                    error!(" Failed to write stat {} for {}: {:?}", key.name(), self.sensor_id, e)
                })?;
        }

        info!(
            " Recording {} stopped (run {}): {}",
            self.sensor_id, run.run_id, stats
        );
        Ok(stats)
    }

    /// Live stats of the run in progress
    pub fn live_stats(&self) -> Option<RunningStats> {
        self.active().map(|run| run.downsampler.stats())
    }

    /// Every stat key of the run in progress, for a card displaying it live
    pub fn live_run_stats(&self) -> Option<RunStats> {
        self.active().map(|run| run.downsampler.run_stats())
    }

    /// Tiers written so far by the run in progress
    pub fn tier_count(&self) -> Option<u32> {
        self.active().map(|run| run.downsampler.tier_count())
    }

    /// Current frequency estimate, when the pipeline has a frequency stage
    pub fn latest_frequency(&self) -> Option<f64> {
        self.active()?
            .pipeline
            .frequency()
            .map(|filter| filter.latest_frequency())
    }

    /// Filter pipeline of the run in progress, for mid-run reconfiguration
    pub fn pipeline_mut(&mut self) -> Option<&mut FilterPipeline> {
        self.active_mut().map(|run| &mut run.pipeline)
    }

    fn active(&self) -> Option<&ActiveRun> {
        match &self.state {
            RecorderState::Recording(run) => Some(run),
            RecorderState::Idle => None,
        }
    }

    fn active_mut(&mut self) -> Option<&mut ActiveRun> {
        match &mut self.state {
            RecorderState::Recording(run) => Some(run),
            RecorderState::Idle => None,
        }
    }
}
