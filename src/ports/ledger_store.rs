//! LedgerStore port - key-addressed record store for ledger entries.
//!
//! The engine's concurrency model rests entirely on this contract: no
//! cross-key transactions, no locks, just a version-conditioned write.
//! Every mutating operation reads an entry, computes the new state, and
//! writes back conditioned on the version it read; losers re-read and
//! retry.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, DonationId, TicketId};
use crate::domain::ledger::LedgerEntry;

/// Outcome of a version-conditioned write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The stored version matched and the entry was written.
    Committed,
    /// Another writer got there first; re-read and retry.
    VersionConflict,
}

/// Port for persisting ledger entries.
///
/// Implementations must make `put_if_version` atomic with respect to
/// concurrent writers of the same key (a conditional update in the
/// backing store), and `insert` must refuse to overwrite.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts a new entry. Creation only.
    ///
    /// # Errors
    ///
    /// - `Conflict` if an entry with this donation id already exists
    async fn insert(&self, entry: &LedgerEntry) -> Result<(), DomainError>;

    /// Fetches an entry by donation id.
    async fn get(&self, donation_id: &DonationId) -> Result<Option<LedgerEntry>, DomainError>;

    /// Writes an entry back, conditioned on the stored version still
    /// being `expected_version`. The entry carries its own (already
    /// incremented) new version.
    async fn put_if_version(
        &self,
        entry: &LedgerEntry,
        expected_version: u64,
    ) -> Result<WriteOutcome, DomainError>;

    /// Resolves the entry owning a payment intent reference.
    async fn find_by_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<LedgerEntry>, DomainError>;

    /// Resolves the entry carrying a ticket code.
    async fn find_by_ticket(
        &self,
        ticket_id: &TicketId,
    ) -> Result<Option<LedgerEntry>, DomainError>;
}
