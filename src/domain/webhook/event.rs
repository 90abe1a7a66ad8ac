//! Provider webhook event model.
//!
//! Only the fields the reconciler acts on are captured; the rest of the
//! provider's event schema is ignored.

use serde::{Deserialize, Serialize};

use crate::domain::ledger::PaymentOutcome;

use super::WebhookError;

/// Event types the engine reconciles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEventKind {
    /// The payment intent settled successfully.
    PaymentIntentSucceeded,
    /// The payment intent failed.
    PaymentIntentFailed,
    /// Anything else; acknowledged but not processed.
    Unknown(String),
}

impl ProviderEventKind {
    fn from_wire(s: &str) -> Self {
        match s {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentFailed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// A verified, decoded webhook delivery.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEvent {
    /// Provider-assigned event id — the idempotency key.
    pub id: String,

    /// Wire-format event type (e.g. "payment_intent.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the provider created the event (Unix seconds).
    pub created: i64,

    /// Event-specific object, polymorphic on the event type.
    pub data: ProviderEventData,
}

/// Container for the event's object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEventData {
    pub object: serde_json::Value,
}

impl ProviderEvent {
    /// Decodes a payload. Only called after signature verification.
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    /// The recognized kind of this event.
    pub fn kind(&self) -> ProviderEventKind {
        ProviderEventKind::from_wire(&self.event_type)
    }

    /// The payment outcome this event reports, if it reports one.
    pub fn outcome(&self) -> Option<PaymentOutcome> {
        match self.kind() {
            ProviderEventKind::PaymentIntentSucceeded => Some(PaymentOutcome::Succeeded),
            ProviderEventKind::PaymentIntentFailed => Some(PaymentOutcome::Failed),
            ProviderEventKind::Unknown(_) => None,
        }
    }

    /// The payment intent the event refers to.
    ///
    /// For `payment_intent.*` events this is the object's own id.
    pub fn payment_intent_id(&self) -> Result<&str, WebhookError> {
        self.data
            .object
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or(WebhookError::MissingField("data.object.id"))
    }
}
