use serde::Deserialize;
use std::time::Duration;

/// Default address the server binds to
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Default cap on requests handled at the same time, across all clients
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// Default grace period for in-flight requests on shutdown (milliseconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5000;

/// Default maximum number of URLs accepted in one request body
pub const DEFAULT_MAX_URLS: usize = 20;

/// Default maximum number of concurrent sub-requests per inbound request
pub const DEFAULT_MAX_CONCURRENT_SUB_REQUESTS: usize = 4;

/// Default timeout for a single sub-request (milliseconds)
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 1000;

/// Main configuration structure for url-mux
///
/// Every section is optional; missing values fall back to the defaults above.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Inbound server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(rename = "listen-addr")]
    pub listen_addr: String,

    /// Maximum number of requests served concurrently
    #[serde(rename = "max-connections")]
    pub max_connections: usize,

    /// Grace period for in-flight requests after a shutdown signal (milliseconds)
    #[serde(rename = "shutdown-timeout-ms")]
    pub shutdown_timeout_ms: u64,
}

impl ServerConfig {
    /// Returns the shutdown grace period as a Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

/// Per-request limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of URLs in one request body
    #[serde(rename = "max-urls")]
    pub max_urls: usize,

    /// Maximum number of sub-requests in flight for one request
    #[serde(rename = "max-concurrent-sub-requests")]
    pub max_concurrent_sub_requests: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_urls: DEFAULT_MAX_URLS,
            max_concurrent_sub_requests: DEFAULT_MAX_CONCURRENT_SUB_REQUESTS,
        }
    }
}

/// Outbound sub-request configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout for one sub-request, body included (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl FetchConfig {
    /// Returns the sub-request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
        }
    }
}
