// credits_webhook_backend/src/error.rs
// Webhook failure taxonomy and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Invalid Signature")]
    Unauthorized,

    /// Caller's fault: undecodable payload or missing user id.
    #[error("{0}")]
    BadRequest(String),

    #[error("credit store not configured")]
    StoreUnavailable,

    #[error("Database update failed")]
    Store(#[from] StoreError),

    /// Our fault: anything unexpected while handling the delivery.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Store(e) => tracing::error!(error = %e, "Database update failed"),
            Self::Internal(msg) => tracing::error!(error = %msg, "Unexpected webhook failure"),
            other => tracing::warn!(status = status.as_u16(), error = %other, "Webhook rejected"),
        }

        // Store and internal details stay in the logs.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
