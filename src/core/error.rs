//! Error taxonomy for the price pipeline.
//!
//! Nothing here is fatal to the process: every variant degrades into a
//! user-visible condition alongside whatever data was already assembled.

use thiserror::Error;

/// Failures raised by the live price APIs.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream throttled us. Not retried internally; the user decides
    /// when to ask again.
    #[error("price API rate limit exceeded, retry in a minute")]
    RateLimited,

    /// Network failure, timeout, or an unusable response. A timed-out
    /// request lands here too.
    #[error("price API unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        FetchError::Unavailable(err.to_string())
    }
}

/// Failures of the local price store. An upsert batch that hits one of
/// these is rejected whole; no partial write is ever visible.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("price store backend error: {0}")]
    Backend(#[from] fjall::Error),

    #[error("price store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("price store entry could not be decoded: {0}")]
    Codec(#[from] serde_json::Error),
}
