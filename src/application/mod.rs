//! Application layer - the engine's components as services over ports.
//!
//! Each component holds its collaborators as `Arc<dyn Port>` and stays
//! stateless across invocations; all durable state lives behind the
//! record-store ports.

mod intent;
mod ledger;
mod price_registry;
mod reconciler;
mod validator;

pub use intent::{IntentHandle, PaymentIntentCoordinator};
pub use ledger::{
    CreateEntryRequest, DonationDetails, Ledger, PaymentResolution, TicketSummary,
};
pub use price_registry::PriceRegistry;
pub use reconciler::{WebhookAck, WebhookReconciler};
pub use validator::{TicketValidator, ValidationReceipt};
