//! Strongly-typed identifier value objects.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::DomainError;

/// Unique identifier for a donation or ticket purchase ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonationId(Uuid);

impl DonationId {
    /// Creates a new random DonationId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a DonationId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DonationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DonationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DonationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Characters used in ticket codes. Uppercase letters plus the digits
/// 2-9 so codes stay easy to read back over a radio at the gate.
const TICKET_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ23456789";

/// Length of a generated ticket code.
const TICKET_CODE_LEN: usize = 7;

/// Short, human-readable ticket code printed on tickets and scanned at
/// the gate.
///
/// Codes are opaque at the boundary: an unknown code is `NotFound`, not
/// `InvalidArgument`, so no structural validation happens here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Wraps an existing ticket code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generates a fresh random ticket code.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code: String = (0..TICKET_CODE_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..TICKET_CODE_ALPHABET.len());
                TICKET_CODE_ALPHABET[idx] as char
            })
            .collect();
        Self(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a priced event, assigned by the organizer.
///
/// Unlike the generated ids above this is an external key, so the only
/// structural rule is non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates an EventId, rejecting empty or whitespace-only keys.
    pub fn new(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(DomainError::invalid_argument(
                "event_id",
                "Event id cannot be empty",
            ));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
