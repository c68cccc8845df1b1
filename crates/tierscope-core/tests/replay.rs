//! Record a run through the public API and play it back through the presenter

use tierscope_core::config::{FrequencyConfig, RecorderConfig};
use tierscope_core::recording::SensorRecorder;
use tierscope_core::stats::StatKey;
use tierscope_core::storage::{
    MemoryStore, QueuedSink, Reading, StatsStore, StorageWorker, TimeRange, WriteQueue,
};
use tierscope_core::zoom::{LoadListener, LoadPlan, RangeRequest, ZoomPresenter};

#[derive(Default)]
struct Counter {
    started: usize,
    requests: Vec<RangeRequest>,
}

impl LoadListener for Counter {
    fn on_load_started(&mut self, _plan: &LoadPlan) {
        self.started += 1;
    }

    fn on_readings_loaded(&mut self, request: &RangeRequest, _readings: &[Reading]) {
        self.requests.push(*request);
    }
}

fn record(
    store: &mut MemoryStore,
    stats_store: &mut MemoryStore,
    config: RecorderConfig,
    samples: impl IntoIterator<Item = (i64, f64)>,
) {
    let mut recorder = SensorRecorder::new("sensor", config).unwrap();
    recorder.start_recording("run").unwrap();
    for (t, v) in samples {
        recorder.add_sample(store, t, v).unwrap();
    }
    recorder.stop_recording(store, stats_store).unwrap();
}

#[test]
fn hundred_samples_make_three_tiers() {
    let mut store = MemoryStore::new();
    let mut stats_store = MemoryStore::new();
    let config = RecorderConfig {
        zoom_level_between_tiers: 10,
        ..RecorderConfig::default()
    };
    record(&mut store, &mut stats_store, config, (0..100).map(|t| (t, t as f64)));

    let stats = stats_store.stats("run", "sensor").unwrap().unwrap();
    assert_eq!(stats.get(StatKey::TierCount), Some(3.0));
    assert_eq!(stats.get(StatKey::ZoomLevelBetweenTiers), Some(10.0));
    assert_eq!(store.tier_count("sensor"), 3);
}

#[test]
fn playback_reads_each_subrange_once() {
    let mut store = MemoryStore::new();
    let mut stats_store = MemoryStore::new();
    let config = RecorderConfig {
        zoom_level_between_tiers: 10,
        ideal_displayed_points: 100,
        ..RecorderConfig::default()
    };
    record(
        &mut store,
        &mut stats_store,
        config.clone(),
        (0..100_000).map(|t| (t, (t % 1000) as f64)),
    );

    let mut presenter = ZoomPresenter::open(&stats_store, "run", "sensor", &config).unwrap();
    let mut counter = Counter::default();

    // 10 000 ms visible is 10 000 raw points, 100 per displayed point: tier 2
    let mut range = TimeRange::new(50_000, 59_999);
    presenter.load_readings(&store, range, &mut counter).unwrap();
    assert_eq!(presenter.current_tier(), 2);

    // Pan right in small steps: each step reads only its new slice
    for _ in 0..10 {
        range = TimeRange::new(range.start + 500, range.end + 500);
        presenter.load_readings(&store, range, &mut counter).unwrap();
    }
    assert_eq!(presenter.current_tier(), 2);
    assert_eq!(counter.started, 11);

    let ranges: Vec<TimeRange> = counter.requests.iter().map(|r| r.range).collect();
    assert_eq!(ranges[0], TimeRange::new(50_000, 59_999));
    for (i, r) in ranges[1..].iter().enumerate() {
        let end = 59_999 + 500 * (i as i64 + 1);
        assert_eq!(*r, TimeRange::new(end - 499, end));
    }

    // Every displayed reading is unique and ordered
    let timestamps: Vec<i64> = presenter.data().iter().map(|r| r.timestamp).collect();
    assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn queued_frequency_run_drains_on_stop() {
    static QUEUE: WriteQueue = WriteQueue::new();

    let mut store = MemoryStore::new();
    let mut stats_store = MemoryStore::new();
    let worker = StorageWorker::new(&QUEUE);
    let mut sink = QueuedSink::new(&QUEUE);

    let config = RecorderConfig {
        frequency: Some(FrequencyConfig::hertz(100, 0.5)),
        zoom_level_between_tiers: 4,
        ..RecorderConfig::default()
    };
    let mut recorder = SensorRecorder::new("rotor", config).unwrap();
    recorder.start_recording("run").unwrap();

    let mut last = 0.0;
    for (i, t) in (0..=100).step_by(25).enumerate() {
        let level = if i % 2 == 1 { 1.0 } else { 0.0 };
        last = recorder.add_sample(&mut sink, t, level).unwrap();
        worker.drain(&mut store).unwrap();
    }
    assert_eq!(last, 20.0);

    let stats = recorder.stop_recording(&mut sink, &mut stats_store).unwrap();
    worker.drain(&mut store).unwrap();

    assert_eq!(store.tier("rotor", 0).len(), 5);
    assert_eq!(stats.tier_count(), Some(2));
    // Block [t=0..75] plus the flushed [t=100]
    assert_eq!(store.tier("rotor", 1).len(), 3);
}
