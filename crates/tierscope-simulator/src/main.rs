//! Desktop simulator for the tierscope recording engine.
//!
//! Records two synthetic sensor streams into an in-memory store, then replays
//! a pan/zoom session against the recorded run and logs every tier switch and
//! storage read.
//!
//! | Sensor        | Pipeline                          | Write path            |
//! |---------------|-----------------------------------|-----------------------|
//! | `temperature` | ADC counts scaled to °C           | direct to the store   |
//! | `rotor`       | Hall-sensor pulses to RPM         | queued, drained by a worker |
//!
//! Set `RUST_LOG=debug` to see per-plan and per-query detail.

use log::{error, info};

use tierscope_core::config::{FrequencyConfig, RecorderConfig, ScaleConfig};
use tierscope_core::recording::SensorRecorder;
use tierscope_core::storage::{
    MemoryStore, QueuedSink, Reading, StorageWorker, TimeRange, WriteQueue,
};
use tierscope_core::zoom::{LoadListener, LoadPlan, RangeRequest, ZoomPresenter};
use tierscope_core::{Error, Result};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Identifier of the simulated recording run.
const RUN_ID: &str = "sim-run-1";

/// Interval between synthetic samples.
const SAMPLE_INTERVAL_MS: i64 = 5;

/// Length of the simulated recording (ten minutes).
const RUN_DURATION_MS: i64 = 10 * 60 * 1000;

/// Writes for the rotor stream go through this queue.
static ROTOR_QUEUE: WriteQueue = WriteQueue::new();

// ---------------------------------------------------------------------------
// Mock data generation
// ---------------------------------------------------------------------------

/// Generates synthetic sensor readings on a simulated clock.
struct MockSensorGenerator {
    /// Phase of the rotor in revolutions.
    rotor_phase: f64,
}

impl MockSensorGenerator {
    fn new() -> Self {
        Self { rotor_phase: 0.0 }
    }

    /// Thermistor ADC counts: 20–26 °C with slow drift, 12-bit range.
    fn temperature_counts(&self, t_ms: i64) -> f64 {
        let t = t_ms as f64 / 1000.0;
        let celsius = 23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos();
        celsius / 50.0 * 4095.0
    }

    /// Hall-sensor level (0 or 1): one pulse per revolution, speed ramping
    /// between 600 and 1800 RPM.
    fn rotor_level(&mut self, t_ms: i64) -> f64 {
        let t = t_ms as f64 / 1000.0;
        let rpm = 1200.0 + 600.0 * (t / 90.0).sin();
        self.rotor_phase += rpm / 60_000.0 * SAMPLE_INTERVAL_MS as f64;
        if self.rotor_phase.fract() < 0.5 { 1.0 } else { 0.0 }
    }
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

fn temperature_config() -> RecorderConfig {
    RecorderConfig {
        zoom_level_between_tiers: 10,
        scale: Some(ScaleConfig {
            source_min: 0.0,
            source_max: 4095.0,
            destination_min: 0.0,
            destination_max: 50.0,
        }),
        ..RecorderConfig::default()
    }
}

fn rotor_config() -> RecorderConfig {
    RecorderConfig {
        zoom_level_between_tiers: 20,
        frequency: Some(FrequencyConfig::rpm(1000, 0.5)),
        ..RecorderConfig::default()
    }
}

/// Record one run of both sensors: readings into `store`, run stats into
/// `stats_store`.
fn record_run(store: &mut MemoryStore, stats_store: &mut MemoryStore) -> Result<()> {
    let mut sensor_gen = MockSensorGenerator::new();
    let mut temperature = SensorRecorder::new("temperature", temperature_config())?;
    let mut rotor = SensorRecorder::new("rotor", rotor_config())?;

    let worker = StorageWorker::new(&ROTOR_QUEUE);
    let mut rotor_sink = QueuedSink::new(&ROTOR_QUEUE);

    temperature.start_recording(RUN_ID)?;
    rotor.start_recording(RUN_ID)?;

    // Live card following the temperature run as it records
    let mut live_card = ZoomPresenter::new(RUN_ID, "temperature", None, temperature.config())?;

    let mut t = 0;
    while t <= RUN_DURATION_MS {
        temperature.add_sample(store, t, sensor_gen.temperature_counts(t))?;
        rotor.add_sample(&mut rotor_sink, t, sensor_gen.rotor_level(t))?;
        // The storage worker keeps up with the producer
        worker.drain(store)?;

        if t % 60_000 == 0 {
            info!(
                "t={}s  rotor {:.0} RPM  temperature tiers {:?}",
                t / 1000,
                rotor.latest_frequency().unwrap_or_default(),
                temperature.tier_count()
            );
            if let Some(stats) = temperature.live_run_stats() {
                live_card.update_stats(stats);
            }
            live_card.load_readings(&*store, TimeRange::new(0, t), &mut ())?;
            info!(
                "  live card: {} readings from tier {}",
                live_card.data().len(),
                live_card.current_tier()
            );
        }
        t += SAMPLE_INTERVAL_MS;
    }

    let stats = temperature.stop_recording(store, stats_store)?;
    info!("temperature: {}", stats);

    let stats = rotor.stop_recording(&mut rotor_sink, stats_store)?;
    // Drain the flushed partial blocks instead of abandoning them
    let flushed = worker.drain(store)?;
    info!("rotor: {} ({} writes drained after stop)", stats, flushed);
    Ok(())
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Logs presenter signals the way a chart widget would consume them.
#[derive(Default)]
struct LoggingListener {
    reads: usize,
    readings: usize,
}

impl LoadListener for LoggingListener {
    fn on_load_started(&mut self, plan: &LoadPlan) {
        if plan.tier_changed {
            info!("  tier -> {}, reloading", plan.tier);
        }
    }

    fn on_readings_loaded(&mut self, request: &RangeRequest, readings: &[Reading]) {
        self.reads += 1;
        self.readings += readings.len();
        info!(
            "  read tier {} {} -> {} readings",
            request.tier,
            request.range,
            readings.len()
        );
    }

    fn on_load_failed(&mut self, request: &RangeRequest, error: Error) {
        error!("  read tier {} {} failed: {}", request.tier, request.range, error);
    }
}

/// Replay a pan/zoom session over one recorded sensor.
fn replay(store: &MemoryStore, stats_store: &MemoryStore, sensor_id: &str) -> Result<()> {
    let config = RecorderConfig::default();
    let mut presenter = ZoomPresenter::open(stats_store, RUN_ID, sensor_id, &config)?;
    let mut listener = LoggingListener::default();

    let minute = 60_000;
    let session = [
        ("whole run", TimeRange::new(0, RUN_DURATION_MS)),
        ("zoom to 2 min", TimeRange::new(4 * minute, 6 * minute)),
        ("pan right 30 s", TimeRange::new(4 * minute + 30_000, 6 * minute + 30_000)),
        ("pan left 1 min", TimeRange::new(3 * minute + 30_000, 5 * minute + 30_000)),
        ("zoom to 5 s", TimeRange::new(5 * minute, 5 * minute + 5_000)),
        ("zoom back out", TimeRange::new(0, RUN_DURATION_MS)),
    ];

    info!("Replaying {} ({} tiers)", sensor_id, store.tier_count(sensor_id));
    for (step, range) in session {
        info!("{} {}", step, range);
        presenter.load_readings(store, range, &mut listener)?;
        info!(
            "  showing {} readings from tier {}",
            presenter.data().points_in(range).count(),
            presenter.current_tier()
        );
    }

    info!(
        "{}: {} reads, {} readings fetched",
        sensor_id, listener.reads, listener.readings
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn run() -> Result<()> {
    let mut store = MemoryStore::new();
    let mut stats_store = MemoryStore::new();

    info!(
        "Recording {} s at {} ms per sample",
        RUN_DURATION_MS / 1000,
        SAMPLE_INTERVAL_MS
    );
    record_run(&mut store, &mut stats_store)?;

    replay(&store, &stats_store, "temperature")?;
    replay(&store, &stats_store, "rotor")?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting tierscope simulator");

    if let Err(e) = run() {
        error!("Simulation failed: {}", e);
        std::process::exit(1);
    }

    info!("Simulator exiting");
}
