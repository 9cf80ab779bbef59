//! Fan-out of sub-requests
//!
//! One task is spawned per URL. Tasks share a per-request admission
//! semaphore that caps how many sub-requests are in flight, and a
//! cancellation token that stops new work once raised. Every task emits
//! exactly one `FetchResult` on the request's result channel.

use crate::mux::fetcher::{FetchError, FetchedResponse, Fetcher};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// What a single fetch task ended with
#[derive(Debug)]
pub enum FetchOutcome {
    /// The sub-request returned a response; its body is still unread
    Fetched(FetchedResponse),

    /// The sub-request failed
    Failed(FetchError),

    /// The request was already cancelled when the task got its slot,
    /// so no sub-request was issued
    Abandoned,
}

/// Result emitted by one fetch task
#[derive(Debug)]
pub struct FetchResult {
    pub url: String,
    pub outcome: FetchOutcome,
}

/// Spawns bounded, cancellable fetch tasks for a list of URLs
#[derive(Clone)]
pub struct Dispatcher {
    fetcher: Arc<dyn Fetcher>,
    max_concurrent: usize,
}

impl Dispatcher {
    /// Creates a dispatcher allowing `max_concurrent` sub-requests per dispatch
    pub fn new(fetcher: Arc<dyn Fetcher>, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Maximum number of sub-requests in flight for one dispatch
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Starts one fetch task per URL
    ///
    /// Duplicate URLs are fetched independently. The returned `Dispatch`
    /// yields exactly `urls.len()` results, in completion order, then ends.
    ///
    /// # Arguments
    ///
    /// * `urls` - The URLs to fetch
    /// * `token` - Cancellation token for this request; shared by all tasks
    pub fn dispatch(&self, urls: Vec<String>, token: CancellationToken) -> Dispatch {
        let pool = Arc::new(Semaphore::new(self.max_concurrent));
        // Capacity 1: each emission waits until the aggregator has room for it
        let (tx, rx) = mpsc::channel(1);
        let total = urls.len();

        for url in urls {
            let task = FetchTask {
                url,
                fetcher: Arc::clone(&self.fetcher),
                pool: Arc::clone(&pool),
                token: token.clone(),
            };
            tokio::spawn(task.run(tx.clone()));
        }

        tracing::debug!(
            "Dispatched {} sub-requests (max {} concurrent)",
            total,
            self.max_concurrent
        );

        // The channel closes once every task has dropped its sender
        Dispatch {
            results: rx,
            token,
            remaining: total,
        }
    }
}

/// Handle on the results of one dispatch
pub struct Dispatch {
    results: mpsc::Receiver<FetchResult>,
    token: CancellationToken,
    remaining: usize,
}

impl Dispatch {
    /// Waits for the next completed result
    ///
    /// Returns `None` once every task has reported.
    pub async fn next(&mut self) -> Option<FetchResult> {
        let result = self.results.recv().await;
        if result.is_some() {
            self.remaining -= 1;
        }
        result
    }

    /// Number of results not yet received
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Cancels every pending and in-flight sub-request of this dispatch
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once the dispatch has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// One outbound fetch attempt
struct FetchTask {
    url: String,
    fetcher: Arc<dyn Fetcher>,
    pool: Arc<Semaphore>,
    token: CancellationToken,
}

impl FetchTask {
    async fn run(self, results: mpsc::Sender<FetchResult>) {
        let outcome = self.attempt().await;
        let result = FetchResult {
            url: self.url,
            outcome,
        };

        // The receiver is gone once the request has been answered
        if results.send(result).await.is_err() {
            tracing::trace!("Result discarded, request already finished");
        }
    }

    async fn attempt(&self) -> FetchOutcome {
        // The permit is released when this function returns, on every path
        let _permit = match self.pool.acquire().await {
            Ok(permit) => permit,
            Err(_) => return FetchOutcome::Abandoned,
        };

        if self.token.is_cancelled() {
            tracing::debug!("Skipping {}: request cancelled", self.url);
            return FetchOutcome::Abandoned;
        }

        match self.fetcher.fetch(&self.url, &self.token).await {
            Ok(response) => {
                tracing::debug!("Fetched {} ({})", self.url, response.status());
                FetchOutcome::Fetched(response)
            }
            Err(e) => {
                tracing::warn!("Sub-request to {} failed: {}", self.url, e);
                FetchOutcome::Failed(e)
            }
        }
    }
}
