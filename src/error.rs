// src/error.rs

//! Unified error handling for the proxy pool.

use thiserror::Error;

/// Result type alias for pool operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for source fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Errors raised synchronously at the point of misuse.
///
/// Fetch failures never appear here; they are absorbed inside the
/// per-source cache and surface only as "nothing refreshed".
#[derive(Error, Debug)]
pub enum AppError {
    /// Collector or registry configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unrecognized filter key
    #[error("Invalid filter option: {0}")]
    InvalidFilterOption(String),

    /// Operation referenced a source that is not registered or not owned
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Operation referenced a source type that is not registered
    #[error("{0} is not a defined source type")]
    InvalidSourceType(String),

    /// Source name registered twice
    #[error("{0} is already a defined source")]
    SourceAlreadyDefined(String),

    /// Source type name registered twice
    #[error("{0} is already a defined source type")]
    SourceTypeAlreadyDefined(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL construction failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid-filter-option error.
    pub fn invalid_filter_option(message: impl Into<String>) -> Self {
        Self::InvalidFilterOption(message.into())
    }

    /// Create an invalid-source error.
    pub fn invalid_source(message: impl Into<String>) -> Self {
        Self::InvalidSource(message.into())
    }
}

/// Recoverable failures of a single source fetch.
///
/// Both variants are transient: the cache logs them and reports the
/// attempt as a no-op refresh. Anything else a fetcher does wrong is a
/// programming error and panics through.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure, timeout, or non-success status from the upstream
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    /// Upstream responded, but the payload did not parse
    #[error("Malformed proxy list: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Create a malformed-payload error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Create an upstream-unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}
