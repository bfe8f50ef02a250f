//! Error and deny response types for the quota layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tower::BoxError;

/// Terminal response for a request whose quota is exhausted.
///
/// Renders as `402 Payment Required` with body `{"message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaDenied {
    /// Resolved deny message.
    pub message: String,
}

impl QuotaDenied {
    /// Create a deny response with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for QuotaDenied {
    fn into_response(self) -> Response {
        (StatusCode::PAYMENT_REQUIRED, Json(self)).into_response()
    }
}

/// Failures raised before the request reaches its handler.
///
/// These are not handled by the layer; they surface as the service error so
/// the host's own error handling decides the response.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The field state query to the quota service failed.
    #[error("field state query failed: {0}")]
    Query(#[from] prici_client::ClientError),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match &self {
            Self::Query(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Quota service query failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "quota service unavailable".to_string(),
                )
                    .into_response()
            }
        }
    }
}

/// Errors returned by the usage extractors.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    /// The handler demanded a usage tag but the request was not tagged.
    #[error("request carries no usage tag")]
    MissingTag,
}

impl IntoResponse for UsageError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingTag => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()).into_response()
            }
        }
    }
}

/// Error handler for use with `axum::error_handling::HandleErrorLayer`.
///
/// Renders [`GateError`] through its `IntoResponse` impl and anything else
/// as a plain 500.
pub async fn handle_error(err: BoxError) -> Response {
    match err.downcast::<GateError>() {
        Ok(gate) => (*gate).into_response(),
        Err(other) => {
            tracing::error!(error = %other, "Unhandled middleware error");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()).into_response()
        }
    }
}
