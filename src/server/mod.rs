//! HTTP server for url-mux
//!
//! This module wires the multiplexer into an axum application:
//! - `router`: the `/` route behind the inbound connection limiter
//! - `serve`: binds the listener and runs until a shutdown signal
//! - `serve_with_signals`: the same, with an injectable signal source

mod errors;
mod handler;
mod limit;
mod shutdown;

pub use handler::multiplex;
pub use limit::connection_limit;
pub use shutdown::ShutdownSignals;

use crate::config::Config;
use crate::mux::{Fetcher, Multiplexer};
use crate::MuxError;
use axum::{middleware, routing::any, Router};
use futures::{Stream, StreamExt};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Semaphore};
use tokio_util::sync::CancellationToken;

/// Shared state of the HTTP application
#[derive(Clone)]
pub struct AppState {
    pub multiplexer: Arc<Multiplexer>,
    /// Root token; every request token is a child of it
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Creates the application state
    pub fn new(multiplexer: Multiplexer, shutdown: CancellationToken) -> Self {
        Self {
            multiplexer: Arc::new(multiplexer),
            shutdown,
        }
    }
}

/// Builds the application router
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `max_connections` - Number of requests handled at once across all clients
pub fn router(state: AppState, max_connections: usize) -> Router {
    let limiter = Arc::new(Semaphore::new(max_connections.max(1)));

    Router::new()
        .route("/", any(handler::multiplex))
        .layer(middleware::from_fn_with_state(limiter, limit::connection_limit))
        .with_state(state)
}

/// Runs the server until it is stopped by a process signal
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `fetcher` - Transport for sub-requests
///
/// # Returns
///
/// * `Ok(())` - The server shut down gracefully
/// * `Err(MuxError::ShutdownAborted)` - The grace period expired or a second signal arrived
/// * `Err(MuxError)` - The listener could not be bound or failed
pub async fn serve(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<(), MuxError> {
    let listener = TcpListener::bind(&config.server.listen_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    let shutdown = CancellationToken::new();
    let state = AppState::new(Multiplexer::new(fetcher, &config.limits), shutdown.clone());
    let app = router(state, config.server.max_connections);
    let signals = ShutdownSignals::new()?.into_stream();

    serve_with_signals(
        listener,
        app,
        signals,
        config.server.shutdown_timeout(),
        shutdown,
    )
    .await
}

/// Serves `app` on `listener` until `signals` yields
///
/// The first item starts a graceful shutdown bounded by `grace`. A second
/// item, or the grace period running out, abandons the in-flight requests.
/// `shutdown` is cancelled on the way out either way.
pub async fn serve_with_signals<S>(
    listener: TcpListener,
    app: Router,
    mut signals: S,
    grace: Duration,
    shutdown: CancellationToken,
) -> Result<(), MuxError>
where
    S: Stream<Item = &'static str> + Send + Unpin + 'static,
{
    let (started_tx, started_rx) = oneshot::channel::<S>();

    let graceful = async move {
        match signals.next().await {
            Some(name) => tracing::info!("Received {}, shutting down...", name),
            None => std::future::pending::<()>().await,
        }
        let _ = started_tx.send(signals);
    };

    let forced = async move {
        let mut signals = match started_rx.await {
            Ok(signals) => signals,
            Err(_) => return std::future::pending::<()>().await,
        };
        tokio::select! {
            _ = signals.next() => tracing::warn!("Second shutdown signal, terminating..."),
            _ = tokio::time::sleep(grace) => {
                tracing::warn!("Graceful shutdown timed out after {:?}", grace)
            }
        }
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(graceful)
        .into_future();

    let outcome = tokio::select! {
        result = server => result.map_err(MuxError::from),
        _ = forced => Err(MuxError::ShutdownAborted),
    };

    shutdown.cancel();
    if outcome.is_ok() {
        tracing::info!("Gracefully stopped");
    }
    outcome
}
