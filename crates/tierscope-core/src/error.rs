//! Error types shared across the engine

use thiserror_no_std::Error;

use crate::storage::StoreError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(StoreError),
    #[error("Frequency window must be positive, got {0} ms")]
    InvalidWindow(i64),
    #[error("Scale transform source range is degenerate")]
    InvalidScale,
    #[error("Zoom level between tiers out of range: {0}")]
    InvalidZoomLevel(usize),
    #[error("Ideal displayed point count must be non-zero")]
    InvalidPointCount,
    #[error("A recording is already running")]
    AlreadyRecording,
    #[error("No recording is running")]
    NotRecording,
    #[error("Record could not be encoded")]
    Encode,
    #[error("Stored record could not be decoded")]
    Decode,
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::Storage(err)
    }
}
