use std::io;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use crate::server::AppState;
use crate::MuxError;

/// Multiplexes one `POST /` request
///
/// The body is scanned as it streams in. Every sub-request is tied to a
/// token derived from the server's shutdown token; dropping this future
/// (client disconnect) cancels that token.
pub async fn multiplex(
    State(state): State<AppState>,
    method: Method,
    body: Body,
) -> Result<Response, MuxError> {
    if method != Method::POST {
        return Err(MuxError::MethodNotAllowed);
    }

    let token = state.shutdown.child_token();
    let _guard = token.clone().drop_guard();

    let reader = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
    let payload = state.multiplexer.multiplex(reader, &token).await?;

    Ok(([(header::CONTENT_TYPE, "application/json")], payload).into_response())
}
