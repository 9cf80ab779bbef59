//! Request multiplexing engine
//!
//! This module contains the fan-out/fan-in logic behind one inbound request:
//! - Scanning the URL list out of the request body
//! - Dispatching one bounded, cancellable sub-request per URL
//! - Aggregating the results, aborting on the first failure
//! - Serializing the URL → body mapping

mod aggregator;
mod dispatcher;
mod fetcher;


pub use aggregator::{aggregate, ResultMap};
pub use dispatcher::{Dispatch, Dispatcher, FetchOutcome, FetchResult};
pub use fetcher::{build_http_client, FetchError, FetchedResponse, Fetcher, HttpFetcher};

use crate::config::LimitsConfig;
use crate::scanner::scan;
use crate::MuxError;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// Scans, dispatches, and aggregates one multiplexed request
///
/// A `Multiplexer` holds no per-request state and is shared by all requests.
#[derive(Clone)]
pub struct Multiplexer {
    dispatcher: Dispatcher,
    max_urls: usize,
}

impl Multiplexer {
    /// Creates a multiplexer using `fetcher` for sub-requests
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Transport for sub-requests
    /// * `limits` - URL count and sub-request concurrency limits
    pub fn new(fetcher: Arc<dyn Fetcher>, limits: &LimitsConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(fetcher, limits.max_concurrent_sub_requests),
            max_urls: limits.max_urls,
        }
    }

    /// Maximum number of URLs accepted per request
    pub fn max_urls(&self) -> usize {
        self.max_urls
    }

    /// Maximum number of sub-requests in flight per request
    pub fn max_concurrent(&self) -> usize {
        self.dispatcher.max_concurrent()
    }

    /// Fetches every URL and collects the bodies
    ///
    /// `token` is cancelled on the first failure, which stops every other
    /// sub-request of this call.
    pub async fn fetch_all(
        &self,
        urls: Vec<String>,
        token: &CancellationToken,
    ) -> Result<ResultMap, MuxError> {
        // Nothing is shared across requests; a dedup cache in front of the
        // dispatcher (redis, memcached) would go here.
        let dispatch = self.dispatcher.dispatch(urls, token.clone());
        aggregate(dispatch).await
    }

    /// Handles one request body end to end
    ///
    /// # Arguments
    ///
    /// * `body` - JSON array of URL strings
    /// * `token` - Cancellation token scoped to this request
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<u8>)` - JSON object mapping each URL to its body
    /// * `Err(MuxError)` - The body was rejected or a sub-request failed
    pub async fn multiplex<R>(&self, body: R, token: &CancellationToken) -> Result<Vec<u8>, MuxError>
    where
        R: AsyncRead + Unpin,
    {
        let urls = scan(body, self.max_urls).await?;
        tracing::debug!("Multiplexing {} URLs", urls.len());

        let results = self.fetch_all(urls, token).await?;
        serde_json::to_vec(&results).map_err(MuxError::SerializationFailed)
    }
}
