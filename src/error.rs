//! Typed error enum for the query and storage core.
//!
//! The binary and orchestration layers stay on `anyhow`; the core returns
//! this enum so the HTTP layer can map failure modes to status codes
//! without string matching.

use thiserror::Error;

/// Core error with variants covering every expected failure mode.
///
/// An empty aggregation result is NOT an error — aggregates resolve to
/// zeros or an empty vec.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller passed a non-positive page/page size or a month outside 1-12.
    /// No partial result is returned.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Underlying storage cannot be reached or failed mid-query. Fatal at
    /// startup; an operational failure if it happens while serving.
    #[error("catalog store unavailable: {0}")]
    Store(#[from] sqlx::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
