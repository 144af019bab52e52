//! Error types for Gemini web client operations

/// Errors from Gemini web client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Gemini API error: {0}")]
    Api(String),

    #[error("response parse error: {0}")]
    Parse(String),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
