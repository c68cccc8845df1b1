use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, info, warn};

use super::{ChartData, IncrementalRangeLoader, LoadPlan, RangeRequest, ZoomTierSelector};
use crate::config::RecorderConfig;
use crate::error::{Error, Result};
use crate::stats::RunStats;
use crate::storage::{Reading, ReadingStore, StatsStore, StoreError, TimeRange, scan_range};

/// Receives the progress of presenter loads
///
/// Every method has an empty default so listeners only implement what they
/// display.
pub trait LoadListener {
    /// Fired once per load call, before any read is issued
    fn on_load_started(&mut self, _plan: &LoadPlan) {}

    /// A planned read's readings were merged
    ///
    /// Fired for every read of a plan at once, after the last one completes.
    fn on_readings_loaded(&mut self, _request: &RangeRequest, _readings: &[Reading]) {}

    /// A planned read failed; displayed data has been dropped
    fn on_load_failed(&mut self, _request: &RangeRequest, _error: Error) {}
}

/// Listener that ignores every signal
impl LoadListener for () {}

/// Playback state for one (run, sensor) chart
///
/// Owns the `{tier, loaded range}` state machine: the selector picks a tier
/// for each requested range, the loader turns it into the sub-ranges that
/// still need reading, and results are merged into [`ChartData`].
///
/// Reads can be run synchronously with [`load_readings`](Self::load_readings),
/// or split into [`begin_load`](Self::begin_load) and
/// [`complete`](Self::complete) when they are issued elsewhere. Completed
/// reads are held until every read planned for the current tier has
/// completed, then merged together. Completions from a superseded plan are
/// discarded.
#[derive(Debug)]
pub struct ZoomPresenter {
    run_id: String,
    sensor_id: String,
    stats: Option<RunStats>,
    selector: ZoomTierSelector,
    loader: IncrementalRangeLoader,
    data: ChartData,
    pending: PendingLoad,
    page_size: usize,
}

/// Reads planned for the current generation that have not all completed
#[derive(Debug, Default)]
struct PendingLoad {
    generation: u64,
    outstanding: Vec<RangeRequest>,
    completed: Vec<(RangeRequest, Vec<Reading>)>,
}

impl PendingLoad {
    /// Track the reads of `plan`, dropping anything held from an older generation
    fn track(&mut self, plan: &LoadPlan) {
        if plan.generation != self.generation {
            self.clear();
            self.generation = plan.generation;
        }
        self.outstanding.extend(plan.requests.iter().copied());
    }

    fn is_outstanding(&self, request: &RangeRequest) -> bool {
        self.outstanding.contains(request)
    }

    /// Record a completed read; true when it was the last outstanding one
    fn complete(&mut self, request: &RangeRequest, readings: Vec<Reading>) -> bool {
        self.outstanding.retain(|r| r != request);
        self.completed.push((*request, readings));
        self.outstanding.is_empty()
    }

    fn clear(&mut self) {
        self.outstanding.clear();
        self.completed.clear();
    }
}

impl ZoomPresenter {
    pub fn new(
        run_id: &str,
        sensor_id: &str,
        stats: Option<RunStats>,
        config: &RecorderConfig,
    ) -> Result<Self> {
        if config.page_size == 0 {
            return Err(Error::InvalidPointCount);
        }
        if stats.as_ref().is_none_or(|s| !s.has_zoom_stats()) {
            info!(
                " {} / {} has no zoom stats, reading tier 0 only",
                run_id, sensor_id
            );
        }

        Ok(Self {
            run_id: String::from(run_id),
            sensor_id: String::from(sensor_id),
            stats,
            selector: ZoomTierSelector::new(config.ideal_displayed_points)?,
            loader: IncrementalRangeLoader::new(),
            data: ChartData::new(),
            pending: PendingLoad::default(),
            page_size: config.page_size,
        })
    }

    /// Build a presenter from the stats persisted for a finished run
    pub fn open<T: StatsStore + ?Sized>(
        stats_store: &T,
        run_id: &str,
        sensor_id: &str,
        config: &RecorderConfig,
    ) -> Result<Self> {
        let stats = stats_store.stats(run_id, sensor_id)?;
        Self::new(run_id, sensor_id, stats, config)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn stats(&self) -> Option<&RunStats> {
        self.stats.as_ref()
    }

    /// Replace the run stats used for tier selection
    ///
    /// A card showing a run that is still recording feeds the recorder's live
    /// stats here so that tiers become selectable as they appear. The next
    /// load picks its tier from the new stats.
    pub fn update_stats(&mut self, stats: RunStats) {
        if stats.tier_count() != self.stats.as_ref().and_then(RunStats::tier_count) {
            debug!(
                " {} now has {:?} tiers",
                self.sensor_id,
                stats.tier_count()
            );
        }
        self.stats = Some(stats);
    }

    pub fn current_tier(&self) -> u32 {
        self.selector.current_tier()
    }

    pub fn data(&self) -> &ChartData {
        &self.data
    }

    /// Pick the tier for `range` and plan the reads it still needs
    ///
    /// A tier change drops the displayed data before anything is read.
    pub fn begin_load(&mut self, range: TimeRange) -> LoadPlan {
        let selection = self.selector.select_tier(self.stats.as_ref(), range);
        let plan = self.loader.plan(selection.tier, range);
        if plan.tier_changed {
            info!(
                " {} switched to tier {} for {}",
                self.sensor_id, plan.tier, range
            );
            self.data.reset(plan.tier);
        }
        self.pending.track(&plan);
        plan
    }

    /// Apply the result of one planned read
    ///
    /// Returns false when the request belongs to a superseded plan and was
    /// dropped. Readings are merged once no read of the current tier is
    /// outstanding. A failed read drops the displayed data, the held results
    /// and the loaded bounds, so the next load starts over.
    pub fn complete<L: LoadListener + ?Sized>(
        &mut self,
        request: &RangeRequest,
        result: core::result::Result<Vec<Reading>, StoreError>,
        listener: &mut L,
    ) -> bool {
        if !self.loader.is_current(request) || !self.pending.is_outstanding(request) {
            debug!(
                " Dropping stale load of tier {} {} (gen {})",
                request.tier, request.range, request.generation
            );
            return false;
        }

        match result {
            Ok(readings) => {
                if self.pending.complete(request, readings) {
                    for (request, readings) in self.pending.completed.drain(..) {
                        self.data.merge(&readings);
                        listener.on_readings_loaded(&request, &readings);
                    }
                }
            }
            Err(e) => {
                warn!(
                    " Failed to load {} tier {} {}: {:?}",
                    self.sensor_id, request.tier, request.range, e
                );
                self.loader.reset();
                self.data.clear();
                self.pending.clear();
                listener.on_load_failed(request, Error::Storage(e));
            }
        }
        true
    }

    /// Show `range`, reading only what is not already loaded
    pub fn load_readings<S, L>(&mut self, store: &S, range: TimeRange, listener: &mut L) -> Result<()>
    where
        S: ReadingStore + ?Sized,
        L: LoadListener + ?Sized,
    {
        let plan = self.begin_load(range);
        listener.on_load_started(&plan);

        for request in &plan.requests {
            let result = scan_range(
                store,
                &self.sensor_id,
                request.tier,
                request.range,
                self.page_size,
            );
            let failure = result.as_ref().err().copied();
            self.complete(request, result, listener);
            if let Some(e) = failure {
                return Err(Error::Storage(e));
            }
        }
        Ok(())
    }

    /// Abandon loads in flight and drop the displayed data
    pub fn clear(&mut self) {
        self.loader.reset();
        self.data.clear();
        self.pending.clear();
    }
}
