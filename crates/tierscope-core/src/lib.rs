//! Hardware-independent core library for tierscope
//!
//! This crate contains the platform-agnostic engine behind sensor recording
//! and playback: value filtering (scale transforms and crossing-based
//! frequency estimation), tiered downsampling into zoom tiers, cumulative run
//! statistics, and zoom-tier selection with incremental range loading.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod codec;
pub mod config;
pub mod error;
pub mod filters;
pub mod recording;
pub mod stats;
pub mod storage;
pub mod zoom;

pub use error::{Error, Result};
