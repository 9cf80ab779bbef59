//! url-mux main entry point
//!
//! This is the command-line interface for the url-mux request multiplexer.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url_mux::config::{load_config_with_hash, validate, Config};
use url_mux::{serve, HttpFetcher};

/// url-mux: fetch many URLs with one request
///
/// Accepts `POST /` with a JSON array of URLs, fetches them concurrently and
/// answers with a JSON object mapping every URL to the body it returned.
#[derive(Parser, Debug)]
#[command(name = "url-mux")]
#[command(version = "1.0.0")]
#[command(about = "A fan-out HTTP request multiplexer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path).map_err(|e| {
                tracing::error!("Failed to load configuration: {}", e);
                e
            })?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
    }
    validate(&config)?;

    tracing::info!(
        "Limits: {} connections, {} URLs per request, {} concurrent sub-requests, {}ms timeout",
        config.server.max_connections,
        config.limits.max_urls,
        config.limits.max_concurrent_sub_requests,
        config.fetch.timeout_ms
    );

    let fetcher = Arc::new(HttpFetcher::new(config.fetch.timeout())?);

    match serve(&config, fetcher).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Server stopped: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("url_mux=info,warn"),
            1 => EnvFilter::new("url_mux=debug,info"),
            2 => EnvFilter::new("url_mux=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
