use log::debug;

use crate::storage::TimeRange;

/// One storage read the caller should issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    pub tier: u32,
    pub range: TimeRange,
    /// Loader generation the request was planned in
    pub generation: u64,
}

/// Reads needed to cover a newly requested range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    pub tier: u32,
    /// The tier differs from the previous plan; displayed data must be dropped
    pub tier_changed: bool,
    pub generation: u64,
    /// At most one range below and one above the loaded bounds
    pub requests: heapless::Vec<RangeRequest, 2>,
}

impl LoadPlan {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Tracks which part of the timeline is loaded for the active tier
///
/// Only the sub-ranges outside `[min_loaded, max_loaded]` are requested, and
/// the bounds are extended when the plan is made. Changing tier or calling
/// [`reset`](Self::reset) forgets the bounds and starts a new generation, so
/// results of requests from an older generation can be recognized and
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct IncrementalRangeLoader {
    tier: u32,
    loaded: Option<TimeRange>,
    generation: u64,
}

impl IncrementalRangeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }

    /// Bounds covered by the active tier's planned loads
    pub fn loaded(&self) -> Option<TimeRange> {
        self.loaded
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Plan the reads needed to show `requested` at `tier`
    pub fn plan(&mut self, tier: u32, requested: TimeRange) -> LoadPlan {
        let tier_changed = tier != self.tier;
        if tier_changed {
            self.tier = tier;
            self.reset();
        }

        let mut requests = heapless::Vec::new();
        let covered = match self.loaded {
            None => {
                self.push_request(&mut requests, requested);
                requested
            }
            Some(loaded) => {
                if requested.start < loaded.start {
                    self.push_request(&mut requests, TimeRange::new(requested.start, loaded.start - 1));
                }
                if requested.end > loaded.end {
                    self.push_request(&mut requests, TimeRange::new(loaded.end + 1, requested.end));
                }
                TimeRange::new(
                    requested.start.min(loaded.start),
                    requested.end.max(loaded.end),
                )
            }
        };
        self.loaded = Some(covered);

        debug!(
            " Plan tier {} gen {}: {} new ranges, loaded {}",
            self.tier,
            self.generation,
            requests.len(),
            covered
        );
        LoadPlan {
            tier: self.tier,
            tier_changed,
            generation: self.generation,
            requests,
        }
    }

    /// True when a completed request still belongs to the current state
    pub fn is_current(&self, request: &RangeRequest) -> bool {
        request.generation == self.generation && request.tier == self.tier
    }

    /// Forget the loaded bounds and invalidate requests in flight
    pub fn reset(&mut self) {
        self.loaded = None;
        self.generation += 1;
    }

    fn push_request(&self, requests: &mut heapless::Vec<RangeRequest, 2>, range: TimeRange) {
        // Two slots: below and above the loaded bounds
        let _ = requests.push(RangeRequest {
            tier: self.tier,
            range,
            generation: self.generation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(plan: &LoadPlan) -> Vec<TimeRange> {
        plan.requests.iter().map(|r| r.range).collect()
    }

    #[test]
    fn test_first_plan_loads_whole_range() {
        let mut loader = IncrementalRangeLoader::new();
        let plan = loader.plan(0, TimeRange::new(100, 200));

        assert_eq!(ranges(&plan), vec![TimeRange::new(100, 200)]);
        assert_eq!(loader.loaded(), Some(TimeRange::new(100, 200)));
        assert!(!plan.tier_changed);
    }

    #[test]
    fn test_pan_right_requests_only_new_edge() {
        let mut loader = IncrementalRangeLoader::new();
        loader.plan(0, TimeRange::new(0, 1000));

        let delta = 250;
        let plan = loader.plan(0, TimeRange::new(delta, 1000 + delta));

        assert_eq!(ranges(&plan), vec![TimeRange::new(1001, 1000 + delta)]);
        assert_eq!(loader.loaded(), Some(TimeRange::new(0, 1000 + delta)));
    }

    #[test]
    fn test_pan_left_requests_only_new_edge() {
        let mut loader = IncrementalRangeLoader::new();
        loader.plan(0, TimeRange::new(500, 1000));

        let plan = loader.plan(0, TimeRange::new(200, 700));
        assert_eq!(ranges(&plan), vec![TimeRange::new(200, 499)]);
    }

    #[test]
    fn test_zoom_out_requests_both_edges() {
        let mut loader = IncrementalRangeLoader::new();
        loader.plan(0, TimeRange::new(500, 1000));

        let plan = loader.plan(0, TimeRange::new(0, 2000));
        assert_eq!(
            ranges(&plan),
            vec![TimeRange::new(0, 499), TimeRange::new(1001, 2000)]
        );
    }

    #[test]
    fn test_covered_range_issues_no_reads() {
        let mut loader = IncrementalRangeLoader::new();
        loader.plan(0, TimeRange::new(0, 1000));
        loader.plan(0, TimeRange::new(1000, 1500));

        for requested in [
            TimeRange::new(0, 1500),
            TimeRange::new(200, 300),
            TimeRange::new(1500, 1500),
        ] {
            assert!(loader.plan(0, requested).is_empty());
        }
    }

    #[test]
    fn test_tier_change_resets_bounds() {
        let mut loader = IncrementalRangeLoader::new();
        let first = loader.plan(0, TimeRange::new(0, 1000));

        let plan = loader.plan(1, TimeRange::new(200, 800));

        assert!(plan.tier_changed);
        assert_eq!(plan.tier, 1);
        assert_eq!(ranges(&plan), vec![TimeRange::new(200, 800)]);
        assert!(!loader.is_current(&first.requests[0]));
        assert!(loader.is_current(&plan.requests[0]));
    }

    #[test]
    fn test_reset_invalidates_in_flight_requests() {
        let mut loader = IncrementalRangeLoader::new();
        let plan = loader.plan(0, TimeRange::new(0, 10));

        loader.reset();

        assert!(!loader.is_current(&plan.requests[0]));
        assert_eq!(loader.loaded(), None);
        assert_eq!(loader.plan(0, TimeRange::new(0, 10)).requests.len(), 1);
    }
}
