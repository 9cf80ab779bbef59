//! Fan-in of sub-request results
//!
//! Results are consumed in completion order. The first failure cancels the
//! dispatch and aborts the whole request; partial results are discarded.

use crate::mux::dispatcher::{Dispatch, FetchOutcome, FetchResult};
use crate::MuxError;
use std::collections::HashMap;

/// Fetched bodies keyed by URL
///
/// For duplicate URLs the last completed fetch wins.
pub type ResultMap = HashMap<String, String>;

/// Collects every result of `dispatch` into a `ResultMap`
///
/// # Returns
///
/// * `Ok(ResultMap)` - Every sub-request succeeded
/// * `Err(MuxError::SubFetchFailed)` - A sub-request failed; the dispatch was cancelled
/// * `Err(MuxError::ResponseBodyReadFailed)` - A body could not be read; the dispatch was cancelled
/// * `Err(MuxError::Cancelled)` - The request was cancelled from outside
pub async fn aggregate(mut dispatch: Dispatch) -> Result<ResultMap, MuxError> {
    let mut results = ResultMap::new();

    while let Some(FetchResult { url, outcome }) = dispatch.next().await {
        match outcome {
            FetchOutcome::Fetched(response) => match response.text().await {
                Ok(body) => {
                    results.insert(url, body);
                }
                Err(source) => {
                    dispatch.cancel();
                    tracing::warn!("Failed to read body of {}: {}", url, source);
                    return Err(MuxError::ResponseBodyReadFailed { url, source });
                }
            },
            FetchOutcome::Failed(source) => {
                dispatch.cancel();
                return Err(MuxError::SubFetchFailed { url, source });
            }
            FetchOutcome::Abandoned => {
                tracing::debug!("Request cancelled with {} results pending", dispatch.remaining());
                return Err(MuxError::Cancelled);
            }
        }
    }

    tracing::debug!("Aggregated {} results", results.len());
    Ok(results)
}
