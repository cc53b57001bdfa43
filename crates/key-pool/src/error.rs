//! Error types for pool operations

use crate::tier::CostTier;

/// Errors from pool operations.
///
/// Release anomalies (releasing a key that was never leased) and missing
/// tier metadata are absorbed inside the pool with a warning, not surfaced
/// here: only the caller-actionable failures get variants.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("store connection failed: {0}")]
    Connectivity(String),

    #[error("bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("pool exhausted: no key available for any candidate tier of a {0} request")]
    PoolExhausted(CostTier),
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
