use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::MuxError;

impl MuxError {
    /// HTTP status reported to the client for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            MuxError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MuxError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
