//! Configuration module for url-mux
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Running without a file is valid: every setting has a default.
//!
//! # Example
//!
//! ```no_run
//! use url_mux::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("url-mux.toml")).unwrap();
//! println!("Sub-requests per request: {}", config.limits.max_concurrent_sub_requests);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetchConfig, LimitsConfig, ServerConfig, DEFAULT_FETCH_TIMEOUT_MS,
    DEFAULT_LISTEN_ADDR, DEFAULT_MAX_CONCURRENT_SUB_REQUESTS, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_MAX_URLS, DEFAULT_SHUTDOWN_TIMEOUT_MS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
