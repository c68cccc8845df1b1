//! Playback side: zoom tier selection and incremental range loading
//!
//! [`ZoomTierSelector`] maps a visible time range onto a tier using the
//! run's stats, [`IncrementalRangeLoader`] works out which sub-ranges of that
//! tier still need reading, and [`ZoomPresenter`] ties both to a store and
//! the displayed [`ChartData`].

pub mod data;
pub mod loader;
pub mod presenter;
pub mod selector;

pub use data::ChartData;
pub use loader::{IncrementalRangeLoader, LoadPlan, RangeRequest};
pub use presenter::{LoadListener, ZoomPresenter};
pub use selector::{TIER_HYSTERESIS, TierSelection, ZoomTierSelector};
