// credits_webhook_backend/src/webhook.rs
// Lemon Squeezy webhook handler: authenticate, decode, upgrade the buyer

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::error::WebhookError;
use crate::event::{EventKind, WebhookEnvelope};
use crate::signature::{verify_signature, SIGNATURE_HEADER};
use crate::store::CreditStore;

// ═══════════════════════════════════════════════════════════════════════════════
// WEBHOOK STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct WebhookState {
    pub config: ServiceConfig,
    /// `None` when Supabase credentials are absent; purchases then fail with 500.
    pub store: Option<Arc<dyn CreditStore>>,
}

impl WebhookState {
    pub fn new(config: ServiceConfig, store: Option<Arc<dyn CreditStore>>) -> Self {
        Self { config, store }
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// WEBHOOK HANDLER
// ═══════════════════════════════════════════════════════════════════════════════

/// `body` is taken as raw bytes: the signature covers them exactly.
pub async fn lemon_squeezy_webhook_handler(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<WebhookResponse>, WebhookError> {
    // Over-limit or unreadable bodies still get the JSON error shape.
    let body = body.map_err(|rejection| WebhookError::BadRequest(rejection.body_text()))?;

    authenticate(&state.config, &headers, &body)?;

    let envelope = WebhookEnvelope::parse(&body)?;
    tracing::info!(event_name = %envelope.meta.event_name, "Received webhook event");

    match envelope.kind() {
        EventKind::OrderCreated => handle_order_created(&state, &envelope).await?,
        EventKind::Other(name) => {
            tracing::debug!(event_name = %name, "Unhandled event, acknowledging");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

/// Answer for every non-POST method on the webhook route. The body is never read.
pub async fn method_not_allowed() -> WebhookError {
    WebhookError::MethodNotAllowed
}

fn authenticate(config: &ServiceConfig, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
    let Some(secret) = config.webhook_secret.as_deref() else {
        tracing::warn!("LEMON_SQUEEZY_WEBHOOK_SECRET is not set, skipping signature validation");
        return Ok(());
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if verify_signature(secret, signature, body) {
        Ok(())
    } else {
        Err(WebhookError::Unauthorized)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT HANDLERS
// ═══════════════════════════════════════════════════════════════════════════════

async fn handle_order_created(
    state: &WebhookState,
    envelope: &WebhookEnvelope,
) -> Result<(), WebhookError> {
    let Some(user_id) = envelope.user_id() else {
        tracing::error!("No user_id found in custom_data");
        return Err(WebhookError::BadRequest("No user_id provided".into()));
    };

    let store = state.store.as_ref().ok_or(WebhookError::StoreUnavailable)?;
    let grant = &state.config.credit_grant;

    store.apply_grant(user_id, grant).await?;

    tracing::info!(
        user_id,
        plan = ?grant.plan,
        credits = grant.credits,
        policy = ?grant.policy,
        "Upgraded user"
    );
    Ok(())
}
