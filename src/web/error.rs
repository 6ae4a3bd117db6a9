//! Web error types for the trace server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::runner::TraceError;

/// Error type for web API operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Request rejected before any runner was invoked.
    #[error("{0}")]
    BadRequest(String),

    /// Infrastructure failure while producing a trace.
    #[error("{0}")]
    Internal(String),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let WebError::Internal(msg) = &self {
            tracing::error!("Internal server error: {}", msg);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<TraceError> for WebError {
    fn from(err: TraceError) -> Self {
        if err.is_request_error() {
            WebError::BadRequest(err.to_string())
        } else {
            WebError::Internal(err.to_string())
        }
    }
}
