// Error types for postcache.
// Covers the cache files, credential acquisition, API calls, and CSV export.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostcacheError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired OAuth tokens")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Cache file {} is malformed: {source}", path.display())]
    CacheCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to persist cache file {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Credential acquisition failed: {0}")]
    Credentials(String),

    #[error("Missing consumer key or secret (set TUMBLR_CONSUMER_KEY and TUMBLR_CONSUMER_SECRET)")]
    MissingConsumerKey,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PostcacheError>;
