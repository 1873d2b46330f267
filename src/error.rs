//! Error types for novelsync.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use thiserror::Error;

/// Main error type for discovery and extraction.
#[derive(Error, Debug)]
pub enum ScraperError {
    /// No strategy is registered for the URL's authority. Callers should skip the novel.
    #[error("Unsupported site: {0}")]
    UnsupportedSite(String),

    /// A strategy was registered twice for the same authority.
    #[error("A strategy is already registered for {0}")]
    DuplicateStrategy(String),

    /// A configured CSS selector failed to compile.
    #[error("Invalid selector for '{field}': {selector}")]
    InvalidSelector { field: &'static str, selector: String },

    /// The server answered with a non-retryable failure status.
    #[error("HTTP {status} while fetching {url}")]
    Fetch { url: String, status: u16 },

    /// The server kept answering 503 until the retry budget ran out.
    #[error("Gave up on {url} after {attempts} attempts")]
    FetchExhausted { url: String, attempts: u32 },

    /// The last listing page number could not be determined.
    #[error("Could not determine the last listing page of {url}: {reason}")]
    PaginationParse { url: String, reason: String },

    /// Transport-level failure (DNS, TLS, connection reset, body decode).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing or validation failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The run was cancelled before the operation finished.
    #[error("Operation cancelled")]
    Cancelled,
}

impl ScraperError {
    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScraperError::Fetch { status, .. } => Some(*status),
            ScraperError::FetchExhausted { .. } => Some(503),
            ScraperError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ScraperError {
    fn from(e: url::ParseError) -> Self {
        ScraperError::InvalidUrl(e.to_string())
    }
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error type for the chapter store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read or write a store file
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON could not be parsed or produced
    #[error("Malformed store data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using anyhow for application-level error handling.
pub type Result<T> = anyhow::Result<T>;
