//! HTTP fetcher implementation
//!
//! This module is the seam between the multiplexer and the network:
//! - The `Fetcher` trait: one cancellable GET per call
//! - `HttpFetcher`: the reqwest-backed implementation used by the server
//! - `FetchedResponse`: status plus a body that is read later by the aggregator

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors a single sub-request can end with
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timeout")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("{0}")]
    Http(reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Http(err)
        }
    }
}

/// Response of a successful sub-request
///
/// The body has not been read yet; reading it may still fail.
pub struct FetchedResponse {
    status: u16,
    body: BoxStream<'static, Result<Bytes, FetchError>>,
}

impl FetchedResponse {
    /// Wraps a status code and a streaming body
    pub fn new<S>(status: u16, body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, FetchError>> + Send + 'static,
    {
        Self {
            status,
            body: body.boxed(),
        }
    }

    /// Builds a response whose body is already in memory
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(status, stream::iter(std::iter::once(Ok(body.into()))))
    }

    /// HTTP status code of the response
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Reads the whole body and decodes it as text
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD rather than rejected.
    pub async fn text(mut self) -> Result<String, FetchError> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.body.try_next().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl fmt::Debug for FetchedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Transport used to issue sub-requests
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues one GET for `url`
    ///
    /// Implementations must give up with `FetchError::Cancelled` once `token`
    /// is cancelled. Non-2xx statuses are not errors.
    async fn fetch(
        &self,
        url: &str,
        token: &CancellationToken,
    ) -> Result<FetchedResponse, FetchError>;
}

/// Builds the HTTP client used for sub-requests
///
/// # Arguments
///
/// * `timeout` - Total time allowed for one sub-request, body included
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// `Fetcher` backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a fresh client using `timeout` per sub-request
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(timeout)?,
        })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        token: &CancellationToken,
    ) -> Result<FetchedResponse, FetchError> {
        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(FetchError::Cancelled),
            result = self.client.get(url).send() => result?,
        };

        let status = response.status().as_u16();
        let body = response.bytes_stream().map_err(FetchError::from);
        Ok(FetchedResponse::new(status, body))
    }
}
