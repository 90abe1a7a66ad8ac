//! PriceRegistry - administrative control over per-event pricing.

use std::sync::Arc;

use crate::domain::foundation::{require_identity, CallerIdentity, DomainError, EventId};
use crate::domain::pricing::{EventPriceConfig, PriceQuote};
use crate::ports::PriceStore;

/// Manages fixed-price configuration for events.
///
/// Setting and unsetting prices are administrative operations and
/// require a verified caller; reading a price is public (the checkout
/// page shows it to everyone).
pub struct PriceRegistry {
    prices: Arc<dyn PriceStore>,
}

impl PriceRegistry {
    pub fn new(prices: Arc<dyn PriceStore>) -> Self {
        Self { prices }
    }

    /// Sets (or replaces) the fixed price for an event.
    ///
    /// Concurrent setters resolve last-write-wins at the store; price
    /// changes are rare administrative actions and need no version
    /// counter.
    pub async fn set_price(
        &self,
        caller: Option<&CallerIdentity>,
        event_id: EventId,
        amount_minor_units: i64,
        currency: &str,
        event_name: &str,
    ) -> Result<EventPriceConfig, DomainError> {
        let caller = require_identity(caller)?;
        let config = EventPriceConfig::new(event_id, amount_minor_units, currency, event_name)?;
        self.prices.put(&config).await?;
        tracing::info!(
            event_id = %config.event_id,
            amount_minor_units = config.amount_minor_units,
            set_by = caller.subject(),
            "fixed event price set"
        );
        Ok(config)
    }

    /// Removes the fixed price for an event, returning it to
    /// donation-based pricing. Removing an absent config is a no-op.
    pub async fn unset_price(
        &self,
        caller: Option<&CallerIdentity>,
        event_id: &EventId,
    ) -> Result<(), DomainError> {
        let caller = require_identity(caller)?;
        self.prices.delete(event_id).await?;
        tracing::info!(event_id = %event_id, unset_by = caller.subject(), "fixed event price removed");
        Ok(())
    }

    /// Looks up the current price for an event.
    pub async fn get_price(&self, event_id: &EventId) -> Result<PriceQuote, DomainError> {
        Ok(match self.prices.get(event_id).await? {
            Some(config) => PriceQuote::Fixed(config),
            None => PriceQuote::DonationBased,
        })
    }
}
