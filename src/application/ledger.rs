//! Ledger - the owner of every donation/ticket lifecycle record.
//!
//! All other components mutate entries only through this service. Every
//! mutation follows the same discipline: read the entry, apply the pure
//! aggregate method, write back conditioned on the version that was
//! read, and on a lost race re-read and re-apply. The aggregate's
//! idempotency record makes the re-application safe — a duplicate or
//! stale event resolves to a no-op on the second pass instead of a
//! double effect.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{
    require_identity, CallerIdentity, DomainError, DonationId, EventId, TicketId, Timestamp,
};
use crate::domain::ledger::{
    EntryState, IntentAttachment, LedgerEntry, OutcomeApplication, PaymentOutcome, PurchaseKind,
};
use crate::domain::pricing::PriceQuote;
use crate::ports::{LedgerStore, WriteOutcome};

use super::PriceRegistry;

/// Bounded local retries for a lost version race before surfacing
/// `Conflict`. Conflicts on a single entry are short-lived, so losing
/// three in a row means something is genuinely contended.
const MAX_CAS_RETRIES: u32 = 3;

/// Request to record a new donation or ticket purchase.
#[derive(Debug, Clone)]
pub struct CreateEntryRequest {
    pub event_id: EventId,
    /// Opaque donor reference; `None` records an anonymous donation.
    pub donor_ref: Option<String>,
    /// Donor-chosen amount. Ignored when the event has a fixed price.
    pub requested_amount_minor_units: Option<i64>,
    pub purchase_kind: PurchaseKind,
}

/// Result of applying a payment outcome.
#[derive(Debug, Clone)]
pub struct PaymentResolution {
    pub donation_id: DonationId,
    pub state: EntryState,
    pub application: OutcomeApplication,
}

/// Read model for the post-checkout details page.
#[derive(Debug, Clone, Serialize)]
pub struct DonationDetails {
    pub donation_id: DonationId,
    pub event_id: EventId,
    pub donor_ref: Option<String>,
    pub amount_minor_units: i64,
    pub currency: String,
    pub state: EntryState,
    pub ticket: Option<TicketSummary>,
}

/// Ticket portion of [`DonationDetails`].
#[derive(Debug, Clone, Serialize)]
pub struct TicketSummary {
    pub ticket_id: TicketId,
    pub redeemed: bool,
    pub redeemed_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
}

enum MutationOutcome<T> {
    /// The entry changed; commit it with a conditional write.
    Write(T),
    /// The operation resolved without changing the entry.
    Noop(T),
}

/// The ledger service.
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    prices: Arc<PriceRegistry>,
    /// Currency recorded for donation-based entries, where no price
    /// config supplies one.
    default_currency: String,
}

impl Ledger {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        prices: Arc<PriceRegistry>,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            prices,
            default_currency: default_currency.into(),
        }
    }

    /// Records a new entry in `Created` state.
    ///
    /// A fixed event price overrides any requested amount; without one,
    /// the requested amount must be present and positive.
    pub async fn create_entry(
        &self,
        request: CreateEntryRequest,
    ) -> Result<LedgerEntry, DomainError> {
        let (amount, currency) = match self.prices.get_price(&request.event_id).await? {
            PriceQuote::Fixed(config) => {
                if let Some(requested) = request.requested_amount_minor_units {
                    if requested != config.amount_minor_units {
                        tracing::debug!(
                            event_id = %request.event_id,
                            requested,
                            fixed = config.amount_minor_units,
                            "requested amount ignored in favor of fixed price"
                        );
                    }
                }
                (config.amount_minor_units, config.currency)
            }
            PriceQuote::DonationBased => {
                let amount = request.requested_amount_minor_units.ok_or_else(|| {
                    DomainError::invalid_argument(
                        "amount",
                        "An amount is required for donation-based events",
                    )
                })?;
                if amount <= 0 {
                    return Err(DomainError::invalid_argument(
                        "amount",
                        "Donation amount must be positive",
                    ));
                }
                (amount, self.default_currency.clone())
            }
        };

        let entry = LedgerEntry::create(
            request.event_id,
            request.donor_ref,
            amount,
            currency,
            request.purchase_kind,
        );
        self.store.insert(&entry).await?;
        tracing::info!(
            donation_id = %entry.donation_id,
            event_id = %entry.event_id,
            amount_minor_units = entry.amount_minor_units,
            ticket = entry.is_ticket(),
            "ledger entry created"
        );
        Ok(entry)
    }

    /// Fetches an entry, failing with `NotFound` if absent.
    pub async fn get_entry(&self, donation_id: &DonationId) -> Result<LedgerEntry, DomainError> {
        self.store
            .get(donation_id)
            .await?
            .ok_or_else(|| DomainError::not_found("donation"))
    }

    /// Resolves the entry owning a payment intent, if any.
    pub async fn find_by_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        self.store.find_by_intent(payment_intent_id).await
    }

    /// Attaches a payment intent to an entry.
    ///
    /// Re-attaching the identical intent is a no-op success; a different
    /// intent is a `Conflict` so callers reuse the stored one instead of
    /// leaving two live intents behind.
    pub async fn attach_intent(
        &self,
        donation_id: &DonationId,
        intent_id: &str,
    ) -> Result<LedgerEntry, DomainError> {
        let (entry, attachment) = self
            .mutate_entry(donation_id, |entry| {
                entry.attach_intent(intent_id).map(|att| match att {
                    IntentAttachment::Attached => MutationOutcome::Write(att),
                    IntentAttachment::AlreadyAttached => MutationOutcome::Noop(att),
                })
            })
            .await?;
        if attachment == IntentAttachment::Attached {
            tracing::info!(donation_id = %donation_id, intent_id, "payment intent attached");
        }
        Ok(entry)
    }

    /// Applies a provider outcome under the idempotency contract.
    ///
    /// The external event id is the idempotency key: a duplicate
    /// delivery returns the settled state without error, and a
    /// conflicting late event is absorbed as stale. This is the sole
    /// path from `AwaitingPayment` to `Paid` or `Failed`.
    pub async fn apply_payment_outcome(
        &self,
        donation_id: &DonationId,
        outcome: PaymentOutcome,
        external_event_id: &str,
    ) -> Result<PaymentResolution, DomainError> {
        let (entry, application) = self
            .mutate_entry(donation_id, |entry| {
                entry
                    .apply_outcome(outcome, external_event_id)
                    .map(|app| match app {
                        OutcomeApplication::Applied => MutationOutcome::Write(app),
                        OutcomeApplication::Duplicate | OutcomeApplication::Stale => {
                            MutationOutcome::Noop(app)
                        }
                    })
            })
            .await?;

        match application {
            OutcomeApplication::Applied => {
                tracing::info!(
                    donation_id = %donation_id,
                    external_event_id,
                    state = entry.state.as_str(),
                    "payment outcome applied"
                );
            }
            OutcomeApplication::Duplicate => {
                tracing::debug!(
                    donation_id = %donation_id,
                    external_event_id,
                    "duplicate payment event absorbed"
                );
            }
            OutcomeApplication::Stale => {
                tracing::warn!(
                    donation_id = %donation_id,
                    external_event_id,
                    state = entry.state.as_str(),
                    "late payment event conflicts with settled entry, absorbed"
                );
            }
        }

        Ok(PaymentResolution {
            donation_id: *donation_id,
            state: entry.state,
            application,
        })
    }

    /// Redeems a ticket by its code, exactly once.
    ///
    /// Concurrent calls race on the version counter: one write commits,
    /// the losers re-read, find `Redeemed`, and fail with
    /// `AlreadyRedeemed`.
    pub async fn redeem_ticket(
        &self,
        ticket_id: &TicketId,
        validated_by: &str,
    ) -> Result<LedgerEntry, DomainError> {
        let entry = self
            .store
            .find_by_ticket(ticket_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ticket"))?;

        let (entry, ()) = self
            .mutate_entry(&entry.donation_id, |entry| {
                entry
                    .redeem(validated_by, Timestamp::now())
                    .map(MutationOutcome::Write)
            })
            .await?;
        tracing::info!(
            donation_id = %entry.donation_id,
            ticket_id = %ticket_id,
            validated_by,
            "ticket redeemed"
        );
        Ok(entry)
    }

    /// Marks an entry refunded. Advisory only; a prior redemption is
    /// never retracted.
    pub async fn mark_refunded(
        &self,
        donation_id: &DonationId,
    ) -> Result<LedgerEntry, DomainError> {
        let (entry, ()) = self
            .mutate_entry(donation_id, |entry| {
                entry.mark_refunded().map(MutationOutcome::Write)
            })
            .await?;
        tracing::info!(donation_id = %donation_id, "entry marked refunded");
        Ok(entry)
    }

    /// Details for the post-checkout page, looked up by the payment
    /// intent reference the front-end holds.
    pub async fn get_donation_details(
        &self,
        caller: Option<&CallerIdentity>,
        payment_intent_id: &str,
    ) -> Result<DonationDetails, DomainError> {
        require_identity(caller)?;
        let entry = self
            .store
            .find_by_intent(payment_intent_id)
            .await?
            .ok_or_else(|| DomainError::not_found("donation"))?;

        Ok(DonationDetails {
            donation_id: entry.donation_id,
            event_id: entry.event_id.clone(),
            donor_ref: entry.donor_ref.clone(),
            amount_minor_units: entry.amount_minor_units,
            currency: entry.currency.clone(),
            state: entry.state,
            ticket: entry.ticket_id.clone().map(|ticket_id| TicketSummary {
                ticket_id,
                // Survives a later refund; the flag mirrors the record,
                // not the current state.
                redeemed: entry.redeemed_at.is_some(),
                redeemed_at: entry.redeemed_at,
                expires_at: entry.expires_at,
            }),
        })
    }

    /// Read-mutate-conditional-write loop shared by every mutation.
    ///
    /// The closure runs against a fresh read on every attempt, so a
    /// retry after a lost race re-evaluates the operation against the
    /// winner's state rather than replaying a stale decision.
    async fn mutate_entry<T, F>(
        &self,
        donation_id: &DonationId,
        apply: F,
    ) -> Result<(LedgerEntry, T), DomainError>
    where
        F: Fn(&mut LedgerEntry) -> Result<MutationOutcome<T>, DomainError>,
    {
        for attempt in 0..MAX_CAS_RETRIES {
            let mut entry = self
                .store
                .get(donation_id)
                .await?
                .ok_or_else(|| DomainError::not_found("donation"))?;
            let expected_version = entry.version;

            match apply(&mut entry)? {
                MutationOutcome::Noop(value) => return Ok((entry, value)),
                MutationOutcome::Write(value) => {
                    entry.version = expected_version + 1;
                    match self.store.put_if_version(&entry, expected_version).await? {
                        WriteOutcome::Committed => return Ok((entry, value)),
                        WriteOutcome::VersionConflict => {
                            tracing::debug!(
                                donation_id = %donation_id,
                                attempt,
                                "lost version race, re-reading"
                            );
                        }
                    }
                }
            }
        }
        Err(DomainError::conflict(
            "Exhausted optimistic write retries for entry",
        ))
    }
}
