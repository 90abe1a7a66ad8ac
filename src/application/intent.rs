//! PaymentIntentCoordinator - one live provider intent per ledger entry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, DonationId, ErrorCode};
use crate::ports::{CreateIntentRequest, PaymentProvider};

use super::Ledger;

/// Reference to the provider intent backing an entry.
#[derive(Debug, Clone)]
pub struct IntentHandle {
    pub donation_id: DonationId,
    pub payment_intent_id: String,
    /// Present only when a fresh intent was created on this call; the
    /// secret of an existing intent is not re-issued.
    pub client_secret: Option<String>,
}

/// Creates and tracks the external payment intent for a ledger entry.
///
/// The provider call always happens before any ledger write and outside
/// any lock; the ledger's attach guard is the only synchronization.
/// That makes `create_intent` safe to retry on network failure with the
/// same donation id.
pub struct PaymentIntentCoordinator {
    ledger: Arc<Ledger>,
    provider: Arc<dyn PaymentProvider>,
}

impl PaymentIntentCoordinator {
    pub fn new(ledger: Arc<Ledger>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self { ledger, provider }
    }

    /// Ensures the entry has exactly one provider intent and returns it.
    ///
    /// - An intent already attached is returned unchanged (client retry).
    /// - Otherwise an intent is created with the provider and attached;
    ///   if a concurrent caller attached a different intent in between,
    ///   the freshly created reference is discarded and the stored one
    ///   is returned — never two live intents for one entry.
    pub async fn create_intent(
        &self,
        donation_id: &DonationId,
    ) -> Result<IntentHandle, DomainError> {
        let entry = self.ledger.get_entry(donation_id).await?;
        if let Some(existing) = entry.payment_intent_id {
            tracing::debug!(
                donation_id = %donation_id,
                intent_id = %existing,
                "reusing already-attached payment intent"
            );
            return Ok(IntentHandle {
                donation_id: *donation_id,
                payment_intent_id: existing,
                client_secret: None,
            });
        }

        let request = CreateIntentRequest {
            amount_minor_units: entry.amount_minor_units,
            currency: entry.currency.clone(),
            metadata: HashMap::from([("donation_id".to_string(), donation_id.to_string())]),
        };
        let intent = self
            .provider
            .create_intent(request)
            .await
            .map_err(DomainError::from)?;

        match self.ledger.attach_intent(donation_id, &intent.id).await {
            Ok(_) => Ok(IntentHandle {
                donation_id: *donation_id,
                payment_intent_id: intent.id,
                client_secret: intent.client_secret,
            }),
            Err(err) if err.code == ErrorCode::Conflict => {
                // A concurrent caller won the attach. Their intent is the
                // live one; ours is abandoned unconfirmed.
                let entry = self.ledger.get_entry(donation_id).await?;
                let existing = entry.payment_intent_id.ok_or_else(|| {
                    DomainError::internal("attach conflicted but no intent is stored")
                })?;
                tracing::warn!(
                    donation_id = %donation_id,
                    discarded_intent = %intent.id,
                    kept_intent = %existing,
                    "lost intent-attach race, reusing stored intent"
                );
                Ok(IntentHandle {
                    donation_id: *donation_id,
                    payment_intent_id: existing,
                    client_secret: None,
                })
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryLedgerStore, InMemoryPriceStore};
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::application::{CreateEntryRequest, PriceRegistry};
    use crate::domain::foundation::EventId;
    use crate::domain::ledger::{EntryState, PurchaseKind};
    use crate::ports::ProviderErrorCode;

    fn coordinator(
        provider: Arc<MockPaymentProvider>,
    ) -> (PaymentIntentCoordinator, Arc<Ledger>) {
        let prices = Arc::new(PriceRegistry::new(Arc::new(InMemoryPriceStore::new())));
        let ledger = Arc::new(Ledger::new(
            Arc::new(InMemoryLedgerStore::new()),
            prices,
            "eur",
        ));
        (
            PaymentIntentCoordinator::new(ledger.clone(), provider),
            ledger,
        )
    }

    async fn created_entry(ledger: &Ledger) -> DonationId {
        ledger
            .create_entry(CreateEntryRequest {
                event_id: EventId::new("spring-gala").unwrap(),
                donor_ref: None,
                requested_amount_minor_units: Some(2500),
                purchase_kind: PurchaseKind::Ticket,
            })
            .await
            .unwrap()
            .donation_id
    }

    #[tokio::test]
    async fn creates_and_attaches_an_intent() {
        let provider = Arc::new(MockPaymentProvider::new());
        let (coordinator, ledger) = coordinator(provider.clone());
        let donation_id = created_entry(&ledger).await;

        let handle = coordinator.create_intent(&donation_id).await.unwrap();
        assert_eq!(handle.payment_intent_id, "pi_mock_1");
        assert!(handle.client_secret.is_some());

        let entry = ledger.get_entry(&donation_id).await.unwrap();
        assert_eq!(entry.state, EntryState::AwaitingPayment);
        assert_eq!(entry.payment_intent_id.as_deref(), Some("pi_mock_1"));

        // The intent is sized to the entry.
        let sent = provider.requests();
        assert_eq!(sent[0].amount_minor_units, 2500);
        assert_eq!(
            sent[0].metadata.get("donation_id").map(String::as_str),
            Some(donation_id.to_string().as_str())
        );
    }

    #[tokio::test]
    async fn retry_reuses_the_existing_intent() {
        let provider = Arc::new(MockPaymentProvider::new());
        let (coordinator, ledger) = coordinator(provider.clone());
        let donation_id = created_entry(&ledger).await;

        let first = coordinator.create_intent(&donation_id).await.unwrap();
        let second = coordinator.create_intent(&donation_id).await.unwrap();

        assert_eq!(first.payment_intent_id, second.payment_intent_id);
        // The provider was only called once; the retry never created a
        // second live intent.
        assert_eq!(provider.call_count(), 1);
        assert!(second.client_secret.is_none());
    }

    #[tokio::test]
    async fn concurrent_callers_end_up_sharing_one_intent() {
        let provider = Arc::new(MockPaymentProvider::new());
        let (coordinator, ledger) = coordinator(provider.clone());
        let coordinator = Arc::new(coordinator);
        let donation_id = created_entry(&ledger).await;

        let (a, b) = tokio::join!(
            coordinator.create_intent(&donation_id),
            coordinator.create_intent(&donation_id),
        );
        let a = a.unwrap();
        let b = b.unwrap();

        // Whichever interleaving happened, both callers observe the same
        // intent, and it is the one the ledger stored. The loser's fresh
        // provider intent (if one was created) was discarded unattached.
        assert_eq!(a.payment_intent_id, b.payment_intent_id);
        let entry = ledger.get_entry(&donation_id).await.unwrap();
        assert_eq!(
            entry.payment_intent_id.as_deref(),
            Some(a.payment_intent_id.as_str())
        );
        assert!(provider.call_count() <= 2);
    }

    #[tokio::test]
    async fn provider_failure_is_unavailable_and_leaves_entry_untouched() {
        let provider = Arc::new(MockPaymentProvider::failing(
            ProviderErrorCode::NetworkError,
        ));
        let (coordinator, ledger) = coordinator(provider);
        let donation_id = created_entry(&ledger).await;

        let err = coordinator.create_intent(&donation_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unavailable);

        // No ledger write happened; the caller can retry safely.
        let entry = ledger.get_entry(&donation_id).await.unwrap();
        assert_eq!(entry.state, EntryState::Created);
        assert!(entry.payment_intent_id.is_none());
    }

    #[tokio::test]
    async fn unknown_donation_is_not_found() {
        let provider = Arc::new(MockPaymentProvider::new());
        let (coordinator, _) = coordinator(provider);

        let err = coordinator
            .create_intent(&DonationId::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
