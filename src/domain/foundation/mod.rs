//! Foundation - shared value objects for the engine domain.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{require_identity, CallerIdentity};
pub use errors::{DomainError, ErrorCode};
pub use ids::{DonationId, EventId, TicketId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
