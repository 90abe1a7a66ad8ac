//! Payment lifecycle state machine for ledger entries.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a donation or ticket purchase.
///
/// Transitions are monotonic: once an entry settles there is no path
/// back, and redemption in particular is never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Record created; no payment intent issued yet.
    Created,

    /// A payment intent is attached and the provider outcome is pending.
    AwaitingPayment,

    /// Payment confirmed. Terminal for plain donations; tickets move on
    /// to `Redeemed` at the gate.
    Paid,

    /// Ticket has been used. One-way.
    Redeemed,

    /// Payment failed or was abandoned. Terminal.
    Failed,

    /// Payment was returned after settling. Advisory and terminal; a
    /// prior redemption stays on record.
    Refunded,
}

impl EntryState {
    /// Returns true once a payment outcome (or anything downstream of
    /// one) has been recorded for the entry.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            EntryState::Paid | EntryState::Redeemed | EntryState::Failed | EntryState::Refunded
        )
    }

    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryState::Created => "created",
            EntryState::AwaitingPayment => "awaiting_payment",
            EntryState::Paid => "paid",
            EntryState::Redeemed => "redeemed",
            EntryState::Failed => "failed",
            EntryState::Refunded => "refunded",
        }
    }
}

impl StateMachine for EntryState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use EntryState::*;
        matches!(
            (self, target),
            // From CREATED
            (Created, AwaitingPayment)
                | (Created, Failed)
            // From AWAITING_PAYMENT
                | (AwaitingPayment, Paid)
                | (AwaitingPayment, Failed)
            // From PAID
                | (Paid, Redeemed)
                | (Paid, Refunded)
            // From REDEEMED
                | (Redeemed, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use EntryState::*;
        match self {
            Created => vec![AwaitingPayment, Failed],
            AwaitingPayment => vec![Paid, Failed],
            Paid => vec![Redeemed, Refunded],
            Redeemed => vec![Refunded],
            Failed => vec![],
            Refunded => vec![],
        }
    }
}
