//! Error types for pool operations

/// Errors from pool operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pool configuration error: {0}")]
    Config(String),

    #[error("pool exhausted: {0}")]
    PoolExhausted(String),
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
