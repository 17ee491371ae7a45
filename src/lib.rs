// credits_webhook_backend/src/lib.rs
// Lemon Squeezy purchase webhook → Supabase credit upgrade

use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod event;
pub mod signature;
pub mod store;
pub mod webhook;

pub use config::{ServiceConfig, SupabaseConfig};
pub use error::WebhookError;
pub use store::{CreditGrant, CreditPolicy, CreditStore, PlanStatus, StoreError, SupabaseCreditStore};
pub use webhook::WebhookState;

pub const WEBHOOK_PATH: &str = "/webhook";

pub fn create_router(state: WebhookState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;
    let webhook_router = Router::new()
        .route(
            WEBHOOK_PATH,
            post(webhook::lemon_squeezy_webhook_handler).fallback(webhook::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(Arc::new(state));

    with_service_layers(
        Router::new()
            .merge(webhook_router)
            .route("/health", get(|| async { "OK" })),
    )
}

/// Panic containment (500 JSON) and request tracing, shared by every route.
pub fn with_service_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let msg = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    WebhookError::Internal(msg).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn panics_become_internal_errors() {
        let resp = panic_response(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = panic_response(Box::new(String::from("boom")));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
