//! url-mux: a fan-out/fan-in request multiplexer
//!
//! This crate implements an HTTP service that accepts a JSON array of URLs,
//! fetches every URL concurrently under a per-request concurrency limit, and
//! answers with a single JSON object mapping each URL to the body it returned.
//! The first failing sub-request aborts the whole request.

pub mod config;
pub mod mux;
pub mod scanner;
pub mod server;

use thiserror::Error;

/// Main error type for url-mux operations
///
/// Every variant except `MethodNotAllowed` surfaces to the client as a
/// `500` with the variant's message as a plaintext body.
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("405 only POST method allowed")]
    MethodNotAllowed,

    #[error("500 getting urls from req: {0}")]
    MalformedBody(#[source] scanner::ScanError),

    #[error("500 getting urls from req: {0}")]
    TooManyUrls(#[source] scanner::ScanError),

    #[error("GET {url}: {source}")]
    SubFetchFailed {
        url: String,
        source: mux::FetchError,
    },

    #[error("500 subUrl req body reading error")]
    ResponseBodyReadFailed {
        url: String,
        source: mux::FetchError,
    },

    #[error("500 json result marshaling err")]
    SerializationFailed(#[source] serde_json::Error),

    #[error("500 request cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Graceful shutdown did not complete")]
    ShutdownAborted,
}

impl From<scanner::ScanError> for MuxError {
    fn from(err: scanner::ScanError) -> Self {
        match err {
            scanner::ScanError::TooManyLiterals { .. } => MuxError::TooManyUrls(err),
            other => MuxError::MalformedBody(other),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid listen address: {0}")]
    InvalidAddr(String),
}

/// Result type alias for url-mux operations
pub type Result<T> = std::result::Result<T, MuxError>;

// Re-export commonly used types
pub use config::Config;
pub use mux::{Fetcher, HttpFetcher, Multiplexer, ResultMap};
pub use scanner::{scan, ScanError};
pub use server::{router, serve, AppState};
