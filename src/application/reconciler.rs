//! WebhookReconciler - drives ledger state from provider deliveries.
//!
//! Deliveries arrive at least once, out of order, and concurrently.
//! The reconciler's job is to make that irrelevant: authenticate first,
//! then funnel everything through the ledger's idempotent outcome
//! application, and acknowledge every recognized delivery so the
//! provider never retries forever against a settled entry.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, DonationId};
use crate::domain::ledger::{EntryState, OutcomeApplication};
use crate::domain::webhook::{ProviderEvent, WebhookVerifier};

use super::Ledger;

/// How a delivery was absorbed. Every variant is an acknowledgment; a
/// transport layer maps all of these to success so the provider stops
/// redelivering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAck {
    /// The event advanced an entry's state.
    Processed {
        donation_id: DonationId,
        state: EntryState,
    },
    /// The event (or a conflicting late one) had already been settled;
    /// nothing changed.
    AlreadyApplied {
        donation_id: DonationId,
        state: EntryState,
    },
    /// No entry owns the referenced intent. Logged and acknowledged.
    UnknownIntent,
    /// Recognized delivery of an event type the engine does not act on.
    Ignored { event_type: String },
}

/// Consumes inbound provider events and advances the ledger.
pub struct WebhookReconciler {
    ledger: Arc<Ledger>,
    verifier: WebhookVerifier,
}

impl WebhookReconciler {
    pub fn new(ledger: Arc<Ledger>, verifier: WebhookVerifier) -> Self {
        Self { ledger, verifier }
    }

    /// Handles one raw delivery.
    ///
    /// The signature is checked before the payload is parsed; an
    /// unverifiable delivery fails closed with `Unauthenticated` and is
    /// never acted upon. After that, nothing about the delivery itself
    /// is an error: duplicates, late conflicts, unknown intents and
    /// unhandled event types all resolve to an acknowledgment.
    pub async fn handle_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookAck, DomainError> {
        self.verifier.verify(payload, signature_header)?;

        let event = ProviderEvent::parse(payload)?;
        let Some(outcome) = event.outcome() else {
            tracing::debug!(
                event_id = %event.id,
                event_type = %event.event_type,
                "unhandled webhook event type, acknowledging"
            );
            return Ok(WebhookAck::Ignored {
                event_type: event.event_type,
            });
        };

        let intent_id = event.payment_intent_id()?;
        let Some(entry) = self.ledger.find_by_intent(intent_id).await? else {
            tracing::warn!(
                event_id = %event.id,
                intent_id,
                "webhook references an unknown payment intent, acknowledging"
            );
            return Ok(WebhookAck::UnknownIntent);
        };

        let resolution = self
            .ledger
            .apply_payment_outcome(&entry.donation_id, outcome, &event.id)
            .await?;

        Ok(match resolution.application {
            OutcomeApplication::Applied => WebhookAck::Processed {
                donation_id: resolution.donation_id,
                state: resolution.state,
            },
            OutcomeApplication::Duplicate | OutcomeApplication::Stale => {
                WebhookAck::AlreadyApplied {
                    donation_id: resolution.donation_id,
                    state: resolution.state,
                }
            }
        })
    }
}
