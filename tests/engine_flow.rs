//! End-to-end flows through the assembled engine: pricing, intent
//! creation, webhook reconciliation, and ticket validation against the
//! in-memory stores and the mock payment provider.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use donation_gate::adapters::memory::{InMemoryLedgerStore, InMemoryPriceStore};
use donation_gate::adapters::stripe::MockPaymentProvider;
use donation_gate::application::{
    CreateEntryRequest, Ledger, PaymentIntentCoordinator, PriceRegistry, TicketValidator,
    WebhookAck, WebhookReconciler,
};
use donation_gate::domain::foundation::{CallerIdentity, DonationId, ErrorCode, EventId, TicketId};
use donation_gate::domain::ledger::{EntryState, PurchaseKind};
use donation_gate::domain::webhook::WebhookVerifier;

const WEBHOOK_SECRET: &str = "whsec_engine_flow_test";

struct Engine {
    store: Arc<InMemoryLedgerStore>,
    registry: Arc<PriceRegistry>,
    ledger: Arc<Ledger>,
    coordinator: PaymentIntentCoordinator,
    reconciler: WebhookReconciler,
    validator: Arc<TicketValidator>,
    provider: Arc<MockPaymentProvider>,
}

fn engine() -> Engine {
    let store = Arc::new(InMemoryLedgerStore::new());
    let registry = Arc::new(PriceRegistry::new(Arc::new(InMemoryPriceStore::new())));
    let ledger = Arc::new(Ledger::new(store.clone(), registry.clone(), "eur"));
    let provider = Arc::new(MockPaymentProvider::new());
    Engine {
        store: store.clone(),
        registry: registry.clone(),
        coordinator: PaymentIntentCoordinator::new(ledger.clone(), provider.clone()),
        reconciler: WebhookReconciler::new(ledger.clone(), WebhookVerifier::new(WEBHOOK_SECRET)),
        validator: Arc::new(TicketValidator::new(ledger.clone())),
        ledger,
        provider,
    }
}

fn admin() -> CallerIdentity {
    CallerIdentity::new("admin").unwrap()
}

fn gate(n: usize) -> CallerIdentity {
    CallerIdentity::new(format!("gate-{}", n)).unwrap()
}

fn event_id() -> EventId {
    EventId::new("spring-gala").unwrap()
}

fn sign(payload: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

fn webhook_payload(event_id: &str, event_type: &str, intent_id: &str) -> String {
    format!(
        r#"{{"id":"{}","type":"{}","created":1700000000,"data":{{"object":{{"id":"{}"}}}}}}"#,
        event_id, event_type, intent_id
    )
}

async fn deliver(engine: &Engine, event_id: &str, event_type: &str, intent_id: &str) -> WebhookAck {
    let payload = webhook_payload(event_id, event_type, intent_id);
    engine
        .reconciler
        .handle_event(payload.as_bytes(), &sign(&payload))
        .await
        .unwrap()
}

async fn ticket_purchase(engine: &Engine) -> (DonationId, TicketId) {
    let entry = engine
        .ledger
        .create_entry(CreateEntryRequest {
            event_id: event_id(),
            donor_ref: Some("donor-1".to_string()),
            requested_amount_minor_units: Some(500),
            purchase_kind: PurchaseKind::Ticket,
        })
        .await
        .unwrap();
    let ticket = entry.ticket_id.clone().unwrap();
    (entry.donation_id, ticket)
}

#[tokio::test]
async fn priced_purchase_flows_from_checkout_to_single_redemption() {
    let engine = engine();
    engine
        .registry
        .set_price(Some(&admin()), event_id(), 2500, "usd", "Spring Gala")
        .await
        .unwrap();

    // Requested 500 is ignored for the priced event.
    let (donation_id, ticket) = ticket_purchase(&engine).await;
    let entry = engine.ledger.get_entry(&donation_id).await.unwrap();
    assert_eq!(entry.amount_minor_units, 2500);
    assert_eq!(entry.currency, "usd");

    // Intent created with the provider and attached.
    let handle = engine.coordinator.create_intent(&donation_id).await.unwrap();
    assert_eq!(handle.payment_intent_id, "pi_mock_1");
    let sent = engine.provider.requests();
    assert_eq!(sent[0].amount_minor_units, 2500);
    assert_eq!(sent[0].currency, "usd");

    // Provider confirms asynchronously.
    let ack = deliver(&engine, "evt_1", "payment_intent.succeeded", "pi_mock_1").await;
    assert_eq!(
        ack,
        WebhookAck::Processed {
            donation_id,
            state: EntryState::Paid
        }
    );

    // The gate validates the ticket exactly once.
    let receipt = engine
        .validator
        .validate(Some(&gate(1)), &ticket)
        .await
        .unwrap();
    assert_eq!(receipt.donation_id, donation_id);
    assert_eq!(receipt.donor_ref.as_deref(), Some("donor-1"));

    let err = engine
        .validator
        .validate(Some(&gate(2)), &ticket)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadyRedeemed);
}

#[tokio::test]
async fn donation_based_purchase_uses_the_requested_amount() {
    let engine = engine();
    let (donation_id, _) = ticket_purchase(&engine).await;

    let entry = engine.ledger.get_entry(&donation_id).await.unwrap();
    assert_eq!(entry.amount_minor_units, 500);
    assert_eq!(entry.currency, "eur");
}

#[tokio::test]
async fn client_retry_of_intent_creation_never_issues_a_second_intent() {
    let engine = engine();
    let (donation_id, _) = ticket_purchase(&engine).await;

    let first = engine.coordinator.create_intent(&donation_id).await.unwrap();
    let second = engine.coordinator.create_intent(&donation_id).await.unwrap();

    assert_eq!(first.payment_intent_id, second.payment_intent_id);
    assert_eq!(engine.provider.call_count(), 1);
}

#[tokio::test]
async fn duplicate_webhook_delivery_settles_exactly_once() {
    let engine = engine();
    let (donation_id, _) = ticket_purchase(&engine).await;
    engine.coordinator.create_intent(&donation_id).await.unwrap();

    let first = deliver(&engine, "evt_1", "payment_intent.succeeded", "pi_mock_1").await;
    assert!(matches!(first, WebhookAck::Processed { .. }));
    let paid_at = engine.ledger.get_entry(&donation_id).await.unwrap().paid_at;

    let replay = deliver(&engine, "evt_1", "payment_intent.succeeded", "pi_mock_1").await;
    assert_eq!(
        replay,
        WebhookAck::AlreadyApplied {
            donation_id,
            state: EntryState::Paid
        }
    );

    let entry = engine.ledger.get_entry(&donation_id).await.unwrap();
    assert_eq!(entry.paid_at, paid_at);
    assert_eq!(entry.applied_events, vec!["evt_1".to_string()]);
}

#[tokio::test]
async fn webhook_for_unknown_intent_acknowledges_without_mutating() {
    let engine = engine();
    let (donation_id, _) = ticket_purchase(&engine).await;
    engine.coordinator.create_intent(&donation_id).await.unwrap();
    let before = engine.ledger.get_entry(&donation_id).await.unwrap();

    let ack = deliver(&engine, "evt_9", "payment_intent.succeeded", "pi_stranger").await;
    assert_eq!(ack, WebhookAck::UnknownIntent);

    assert_eq!(engine.store.len().await, 1);
    let after = engine.ledger.get_entry(&donation_id).await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn out_of_order_failure_after_success_is_absorbed() {
    let engine = engine();
    let (donation_id, _) = ticket_purchase(&engine).await;
    engine.coordinator.create_intent(&donation_id).await.unwrap();

    deliver(&engine, "evt_1", "payment_intent.succeeded", "pi_mock_1").await;
    let late = deliver(&engine, "evt_2", "payment_intent.payment_failed", "pi_mock_1").await;

    assert_eq!(
        late,
        WebhookAck::AlreadyApplied {
            donation_id,
            state: EntryState::Paid
        }
    );
}

#[tokio::test]
async fn concurrent_validations_admit_exactly_one_gate() {
    let engine = engine();
    let (donation_id, ticket) = ticket_purchase(&engine).await;
    engine.coordinator.create_intent(&donation_id).await.unwrap();
    deliver(&engine, "evt_1", "payment_intent.succeeded", "pi_mock_1").await;

    let mut tasks = Vec::new();
    for n in 0..8 {
        let validator = engine.validator.clone();
        let ticket = ticket.clone();
        tasks.push(tokio::spawn(async move {
            validator.validate(Some(&gate(n)), &ticket).await
        }));
    }

    let results = futures::future::join_all(tasks).await;
    let mut successes = 0;
    let mut already_redeemed = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => {
                assert_eq!(err.code, ErrorCode::AlreadyRedeemed);
                already_redeemed += 1;
            }
        }
    }

    assert_eq!(successes, 1, "exactly one gate admits the ticket");
    assert_eq!(already_redeemed, 7);

    let entry = engine.ledger.get_entry(&donation_id).await.unwrap();
    assert_eq!(entry.state, EntryState::Redeemed);
}

#[tokio::test]
async fn refund_of_a_redeemed_ticket_never_retracts_the_redemption() {
    let engine = engine();
    let (donation_id, ticket) = ticket_purchase(&engine).await;
    engine.coordinator.create_intent(&donation_id).await.unwrap();
    deliver(&engine, "evt_1", "payment_intent.succeeded", "pi_mock_1").await;

    engine
        .validator
        .validate(Some(&gate(1)), &ticket)
        .await
        .unwrap();

    let refunded = engine.ledger.mark_refunded(&donation_id).await.unwrap();
    assert_eq!(refunded.state, EntryState::Refunded);
    assert!(refunded.redeemed_at.is_some());
    assert_eq!(refunded.redeemed_by.as_deref(), Some("gate-1"));
}

#[tokio::test]
async fn tampered_webhook_is_rejected_before_any_processing() {
    let engine = engine();
    let (donation_id, _) = ticket_purchase(&engine).await;
    engine.coordinator.create_intent(&donation_id).await.unwrap();

    let payload = webhook_payload("evt_1", "payment_intent.succeeded", "pi_mock_1");
    let tampered = payload.replace("succeeded", "payment_failed");
    let err = engine
        .reconciler
        .handle_event(tampered.as_bytes(), &sign(&payload))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthenticated);

    let entry = engine.ledger.get_entry(&donation_id).await.unwrap();
    assert_eq!(entry.state, EntryState::AwaitingPayment);
}

#[tokio::test]
async fn details_page_reflects_redemption_state() {
    let engine = engine();
    let (donation_id, ticket) = ticket_purchase(&engine).await;
    engine.coordinator.create_intent(&donation_id).await.unwrap();
    deliver(&engine, "evt_1", "payment_intent.succeeded", "pi_mock_1").await;

    let before = engine
        .ledger
        .get_donation_details(Some(&admin()), "pi_mock_1")
        .await
        .unwrap();
    assert_eq!(before.state, EntryState::Paid);
    assert!(!before.ticket.as_ref().unwrap().redeemed);

    engine
        .validator
        .validate(Some(&gate(1)), &ticket)
        .await
        .unwrap();

    let after = engine
        .ledger
        .get_donation_details(Some(&admin()), "pi_mock_1")
        .await
        .unwrap();
    assert_eq!(after.state, EntryState::Redeemed);
    let summary = after.ticket.unwrap();
    assert!(summary.redeemed);
    assert!(summary.redeemed_at.is_some());
}
