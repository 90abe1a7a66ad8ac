//! TicketValidator - at-most-one successful validation per ticket.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{
    require_identity, CallerIdentity, DomainError, DonationId, EventId, TicketId, Timestamp,
};

use super::Ledger;

/// Returned to the gate on a successful validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReceipt {
    pub donation_id: DonationId,
    pub ticket_id: TicketId,
    pub event_id: EventId,
    pub donor_ref: Option<String>,
    pub redeemed_at: Timestamp,
}

/// Atomically redeems paid tickets against the ledger.
///
/// The validator is the system's core correctness surface: under
/// concurrent attempts from different gate devices, exactly one call
/// succeeds and every other returns `AlreadyRedeemed` — a replayed
/// ticket never silently succeeds.
pub struct TicketValidator {
    ledger: Arc<Ledger>,
}

impl TicketValidator {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    /// Validates and redeems a ticket.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` without a verified gate identity
    /// - `NotFound` for a code no entry carries
    /// - `NotPaid` when payment has not settled
    /// - `TicketExpired` past the expiry or redemption window
    /// - `AlreadyRedeemed` on any attempt after the first success
    pub async fn validate(
        &self,
        caller: Option<&CallerIdentity>,
        ticket_id: &TicketId,
    ) -> Result<ValidationReceipt, DomainError> {
        let caller = require_identity(caller)?;
        let entry = self.ledger.redeem_ticket(ticket_id, caller.subject()).await?;

        let redeemed_at = entry
            .redeemed_at
            .ok_or_else(|| DomainError::internal("redeemed entry is missing redeemed_at"))?;
        Ok(ValidationReceipt {
            donation_id: entry.donation_id,
            ticket_id: ticket_id.clone(),
            event_id: entry.event_id,
            donor_ref: entry.donor_ref,
            redeemed_at,
        })
    }
}
