//! PriceStore port - record store for event price configuration.
//!
//! Price changes are rare administrative writes, so the contract is
//! last-write-wins; there is no version column here.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventId};
use crate::domain::pricing::EventPriceConfig;

/// Port for persisting event price configuration.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Fetches the active config for an event, if any.
    async fn get(&self, event_id: &EventId) -> Result<Option<EventPriceConfig>, DomainError>;

    /// Upserts the config for its event. Last write wins.
    async fn put(&self, config: &EventPriceConfig) -> Result<(), DomainError>;

    /// Deletes the config if present. Absent is not an error.
    async fn delete(&self, event_id: &EventId) -> Result<(), DomainError>;
}
