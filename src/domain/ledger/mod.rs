//! Ledger domain - the lifecycle record of donations and ticket purchases.

mod entry;
mod state;

pub use entry::{
    IntentAttachment, LedgerEntry, OutcomeApplication, PaymentOutcome, PurchaseKind,
    REDEMPTION_WINDOW_SECS, TICKET_EXPIRY_HOUR_UTC,
};
pub use state::EntryState;
