//! Event pricing configuration.
//!
//! An event either carries a fixed admission price or it doesn't; the
//! absence of a config means attendees choose their own donation amount.

use crate::domain::foundation::{DomainError, EventId, Timestamp};
use serde::{Deserialize, Serialize};

/// Normalizes and validates an ISO 4217 currency code.
///
/// Codes are stored lowercase, matching the payment provider's wire
/// format.
pub fn normalize_currency(code: &str) -> Result<String, DomainError> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DomainError::invalid_argument(
            "currency",
            format!("'{}' is not a three-letter currency code", code),
        ));
    }
    Ok(code.to_ascii_lowercase())
}

/// Fixed-price configuration for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPriceConfig {
    pub event_id: EventId,
    pub amount_minor_units: i64,
    pub currency: String,
    /// Display name shown on checkout and tickets.
    pub event_name: String,
    pub updated_at: Timestamp,
}

impl EventPriceConfig {
    /// Builds a validated price config.
    pub fn new(
        event_id: EventId,
        amount_minor_units: i64,
        currency: &str,
        event_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if amount_minor_units <= 0 {
            return Err(DomainError::invalid_argument(
                "amount_minor_units",
                "Price must be a positive amount in minor units",
            ));
        }
        let event_name = event_name.into();
        if event_name.trim().is_empty() {
            return Err(DomainError::invalid_argument(
                "event_name",
                "Event name cannot be empty",
            ));
        }
        Ok(Self {
            event_id,
            amount_minor_units,
            currency: normalize_currency(currency)?,
            event_name,
            updated_at: Timestamp::now(),
        })
    }
}

/// Answer to a price lookup. Donation-based pricing is a first-class
/// result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PriceQuote {
    /// The event has a fixed price; requested amounts are ignored.
    Fixed(EventPriceConfig),
    /// No fixed price is set; the donor chooses the amount.
    DonationBased,
}

impl PriceQuote {
    pub fn is_fixed(&self) -> bool {
        matches!(self, PriceQuote::Fixed(_))
    }
}
