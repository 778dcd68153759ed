//! HTTP error mapping

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use qasystem_core::QaError;
use serde::{Deserialize, Serialize};

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Status code for a pipeline error
pub fn status_for(err: &QaError) -> StatusCode {
    match err {
        QaError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        QaError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        e if e.is_upstream() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error returned by handlers before any frame was sent
#[derive(Debug)]
pub enum ApiError {
    Pipeline(QaError),
    Body(JsonRejection),
}

impl From<QaError> for ApiError {
    fn from(err: QaError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Pipeline(err) => (status_for(&err), err.to_string()),
            ApiError::Body(rejection) => (rejection.status(), rejection.body_text()),
        };

        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, message);
        } else {
            tracing::warn!("Request rejected ({}): {}", status, message);
        }

        (status, Json(ErrorBody { message })).into_response()
    }
}
