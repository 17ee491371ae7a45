// credits_webhook_backend/src/event.rs
// Lemon Squeezy webhook payload, decoded once into typed form

use serde::{Deserialize, Serialize};

use crate::error::WebhookError;

/// The "purchase completed" event.
pub const ORDER_CREATED: &str = "order_created";

// ═══════════════════════════════════════════════════════════════════════════════
// PAYLOAD TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Only `meta` is consumed; `data` and everything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub meta: WebhookMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMeta {
    pub event_name: String,
    #[serde(default)]
    pub custom_data: Option<CustomData>,
}

/// Checkout custom data we attach when creating the checkout link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomData {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    OrderCreated,
    Other(String),
}

impl WebhookEnvelope {
    /// Decode the raw body. Malformed JSON or a missing `meta.event_name`
    /// is a client error carrying serde's message.
    pub fn parse(raw: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(raw).map_err(|e| WebhookError::BadRequest(e.to_string()))
    }

    pub fn kind(&self) -> EventKind {
        match self.meta.event_name.as_str() {
            ORDER_CREATED => EventKind::OrderCreated,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// `custom_data.user_id` exactly as delivered; blank ids count as missing.
    pub fn user_id(&self) -> Option<&str> {
        self.meta
            .custom_data
            .as_ref()
            .and_then(|c| c.user_id.as_deref())
            .filter(|id| !id.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_order_created_with_user() {
        let raw = br#"{
            "meta": {"event_name": "order_created", "custom_data": {"user_id": "abc", "ref": 7}},
            "data": {"id": "123", "attributes": {"total": 1000, "currency": "USD", "status": "paid"}}
        }"#;
        let env = WebhookEnvelope::parse(raw).unwrap();
        assert_eq!(env.kind(), EventKind::OrderCreated);
        assert_eq!(env.user_id(), Some("abc"));
        let extra = &env.meta.custom_data.as_ref().unwrap().extra;
        assert_eq!(extra.get("ref"), Some(&serde_json::json!(7)));
    }

    #[test]
    fn custom_data_is_optional() {
        let env = WebhookEnvelope::parse(br#"{"meta":{"event_name":"order_created"}}"#).unwrap();
        assert_eq!(env.user_id(), None);

        let env = WebhookEnvelope::parse(
            br#"{"meta":{"event_name":"order_created","custom_data":null}}"#,
        )
        .unwrap();
        assert_eq!(env.user_id(), None);
    }

    #[test]
    fn blank_user_id_is_missing() {
        let env = WebhookEnvelope::parse(
            br#"{"meta":{"event_name":"order_created","custom_data":{"user_id":"  "}}}"#,
        )
        .unwrap();
        assert_eq!(env.user_id(), None);
    }

    #[test]
    fn user_id_is_not_rewritten() {
        let env = WebhookEnvelope::parse(
            br#"{"meta":{"event_name":"order_created","custom_data":{"user_id":" abc "}}}"#,
        )
        .unwrap();
        assert_eq!(env.user_id(), Some(" abc "));
    }

    #[test]
    fn other_events_are_classified() {
        let env =
            WebhookEnvelope::parse(br#"{"meta":{"event_name":"subscription_created"}}"#).unwrap();
        assert_eq!(env.kind(), EventKind::Other("subscription_created".into()));
    }

    #[test]
    fn malformed_json_is_bad_request() {
        let err = WebhookEnvelope::parse(b"{not json").unwrap_err();
        assert!(matches!(err, WebhookError::BadRequest(ref msg) if !msg.is_empty()));
    }

    #[test]
    fn missing_meta_is_bad_request() {
        let err = WebhookEnvelope::parse(br#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, WebhookError::BadRequest(ref msg) if msg.contains("meta")));
    }
}
