//! Ledger entry aggregate.
//!
//! One entry per donation or ticket purchase. The entry owns its whole
//! payment lifecycle: the attached intent, the applied webhook events
//! (its idempotency record), and the redemption fields. All lifecycle
//! rules live here as pure methods; the application layer only adds
//! store round-trips and the optimistic-write loop.
//!
//! # Invariants
//!
//! - `payment_intent_id` is set at most once and never re-issued
//! - `state` moves only along [`EntryState`]'s one-way transitions
//! - an external event id is applied at most once (`applied_events`)
//! - `ticket_id` exists exactly when the purchase is a ticket

use crate::domain::foundation::{
    DomainError, DonationId, EventId, StateMachine, TicketId, Timestamp,
};
use serde::{Deserialize, Serialize};

use super::EntryState;

/// Hour (UTC) on the day after payment at which a ticket expires.
pub const TICKET_EXPIRY_HOUR_UTC: u32 = 5;

/// Tickets must be redeemed within this window after payment.
pub const REDEMPTION_WINDOW_SECS: i64 = 2 * 60 * 60;

/// What kind of purchase an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseKind {
    /// A plain donation; settles at `Paid`.
    Donation,
    /// A donation that doubles as an admission ticket.
    Ticket,
}

/// Outcome reported by the payment provider for an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

/// How a payment outcome related to the entry when it arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeApplication {
    /// The outcome advanced the entry's state.
    Applied,
    /// The exact event id was seen before; nothing changed.
    Duplicate,
    /// A different event arrived after the entry had already settled
    /// (out-of-order delivery); nothing changed.
    Stale,
}

/// Whether an attach call changed the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentAttachment {
    /// The intent was recorded and the entry now awaits payment.
    Attached,
    /// The identical intent was already attached; no-op.
    AlreadyAttached,
}

/// Durable record of one donation or ticket purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub donation_id: DonationId,
    pub event_id: EventId,
    /// Opaque donor reference; `None` means anonymous.
    pub donor_ref: Option<String>,
    pub amount_minor_units: i64,
    pub currency: String,
    /// External provider reference. Immutable once set.
    pub payment_intent_id: Option<String>,
    /// Present only for ticket purchases.
    pub ticket_id: Option<TicketId>,
    pub state: EntryState,
    /// External event ids already applied to this entry.
    pub applied_events: Vec<String>,
    pub paid_at: Option<Timestamp>,
    /// Hard expiry for the ticket, set when the entry becomes `Paid`.
    pub expires_at: Option<Timestamp>,
    pub redeemed_at: Option<Timestamp>,
    /// Identity of the validator device/operator that redeemed the ticket.
    pub redeemed_by: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Monotonic counter for optimistic concurrency control.
    pub version: u64,
}

impl LedgerEntry {
    /// Creates a new entry in `Created` state.
    ///
    /// A ticket code is generated only for ticket purchases. The amount
    /// is assumed already resolved against the price registry.
    pub fn create(
        event_id: EventId,
        donor_ref: Option<String>,
        amount_minor_units: i64,
        currency: impl Into<String>,
        kind: PurchaseKind,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            donation_id: DonationId::new(),
            event_id,
            donor_ref,
            amount_minor_units,
            currency: currency.into(),
            payment_intent_id: None,
            ticket_id: (kind == PurchaseKind::Ticket).then(TicketId::generate),
            state: EntryState::Created,
            applied_events: Vec::new(),
            paid_at: None,
            expires_at: None,
            redeemed_at: None,
            redeemed_by: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Returns true if this entry represents a ticket purchase.
    pub fn is_ticket(&self) -> bool {
        self.ticket_id.is_some()
    }

    /// Attaches a payment intent, moving `Created → AwaitingPayment`.
    ///
    /// Attaching the identical intent again is a no-op; a different one
    /// is a `Conflict` — callers must reuse the stored intent instead of
    /// issuing a second live one.
    pub fn attach_intent(
        &mut self,
        intent_id: &str,
    ) -> Result<IntentAttachment, DomainError> {
        match self.payment_intent_id.as_deref() {
            Some(existing) if existing == intent_id => Ok(IntentAttachment::AlreadyAttached),
            Some(existing) => Err(DomainError::conflict(
                "A different payment intent is already attached",
            )
            .with_detail("existing_intent", existing)
            .with_detail("offered_intent", intent_id)),
            None => {
                self.state = self.state.transition_to(EntryState::AwaitingPayment)?;
                self.payment_intent_id = Some(intent_id.to_string());
                self.updated_at = Timestamp::now();
                Ok(IntentAttachment::Attached)
            }
        }
    }

    /// Applies a provider outcome under the entry's idempotency contract.
    ///
    /// A repeated `external_event_id` never re-applies; an event arriving
    /// after the entry settled is absorbed as stale. Only genuinely new
    /// outcomes on an unsettled entry transition state.
    pub fn apply_outcome(
        &mut self,
        outcome: PaymentOutcome,
        external_event_id: &str,
    ) -> Result<OutcomeApplication, DomainError> {
        if self
            .applied_events
            .iter()
            .any(|id| id == external_event_id)
        {
            return Ok(OutcomeApplication::Duplicate);
        }
        if self.state.is_settled() {
            return Ok(OutcomeApplication::Stale);
        }

        let target = match outcome {
            PaymentOutcome::Succeeded => EntryState::Paid,
            PaymentOutcome::Failed => EntryState::Failed,
        };
        self.state = self.state.transition_to(target)?;
        self.applied_events.push(external_event_id.to_string());

        let now = Timestamp::now();
        if target == EntryState::Paid {
            self.paid_at = Some(now);
            self.expires_at = Some(now.following_day_at(TICKET_EXPIRY_HOUR_UTC));
        }
        self.updated_at = now;
        Ok(OutcomeApplication::Applied)
    }

    /// Redeems the ticket, moving `Paid → Redeemed`.
    ///
    /// Rule order matches what the gate needs to display: a replay is
    /// `AlreadyRedeemed` even when the ticket has also expired or been
    /// refunded since — the redemption record outlives both.
    pub fn redeem(&mut self, validated_by: &str, now: Timestamp) -> Result<(), DomainError> {
        if let Some(at) = &self.redeemed_at {
            return Err(DomainError::already_redeemed()
                .with_detail("redeemed_at", at.to_string()));
        }
        if self.state != EntryState::Paid {
            return Err(DomainError::not_paid(self.state.as_str()));
        }
        if let Some(expires_at) = &self.expires_at {
            if now.is_after(expires_at) {
                return Err(DomainError::ticket_expired("Ticket has expired")
                    .with_detail("expired_at", expires_at.to_string()));
            }
        }
        if let Some(paid_at) = &self.paid_at {
            if now.duration_since(paid_at).num_seconds() > REDEMPTION_WINDOW_SECS {
                return Err(DomainError::ticket_expired(
                    "Ticket is outside its redemption window",
                ));
            }
        }

        self.state = self.state.transition_to(EntryState::Redeemed)?;
        self.redeemed_at = Some(now);
        self.redeemed_by = Some(validated_by.to_string());
        self.updated_at = now;
        Ok(())
    }

    /// Marks the entry refunded. Advisory: allowed from `Paid` and
    /// `Redeemed`, and a prior redemption stays on record.
    pub fn mark_refunded(&mut self) -> Result<(), DomainError> {
        self.state = self.state.transition_to(EntryState::Refunded)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}
