//! Stripe wire types.
//!
//! Only the fields the adapter reads are captured.

use serde::Deserialize;

/// A payment intent as returned by `POST /v1/payment_intents`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    /// Intent id (pi_xxx format).
    pub id: String,

    /// Secret the front-end uses to confirm the payment.
    pub client_secret: Option<String>,

    /// Intent status at creation (e.g. "requires_payment_method").
    pub status: String,
}
