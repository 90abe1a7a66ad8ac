//! In-memory ledger store.
//!
//! Backs tests and local runs. The version check happens under the
//! write lock, which gives this adapter the same atomicity a real
//! record store provides with a conditional update expression.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, DonationId, TicketId};
use crate::domain::ledger::LedgerEntry;
use crate::ports::{LedgerStore, WriteOutcome};

/// Thread-safe in-memory implementation of [`LedgerStore`].
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    entries: Arc<RwLock<HashMap<DonationId, LedgerEntry>>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries. Test helper.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert(&self, entry: &LedgerEntry) -> Result<(), DomainError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&entry.donation_id) {
            return Err(DomainError::conflict(format!(
                "Entry {} already exists",
                entry.donation_id
            )));
        }
        entries.insert(entry.donation_id, entry.clone());
        Ok(())
    }

    async fn get(&self, donation_id: &DonationId) -> Result<Option<LedgerEntry>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries.get(donation_id).cloned())
    }

    async fn put_if_version(
        &self,
        entry: &LedgerEntry,
        expected_version: u64,
    ) -> Result<WriteOutcome, DomainError> {
        let mut entries = self.entries.write().await;
        let Some(stored) = entries.get(&entry.donation_id) else {
            return Err(DomainError::not_found("donation"));
        };
        if stored.version != expected_version {
            return Ok(WriteOutcome::VersionConflict);
        }
        entries.insert(entry.donation_id, entry.clone());
        Ok(WriteOutcome::Committed)
    }

    async fn find_by_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .find(|e| e.payment_intent_id.as_deref() == Some(payment_intent_id))
            .cloned())
    }

    async fn find_by_ticket(
        &self,
        ticket_id: &TicketId,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .find(|e| e.ticket_id.as_ref() == Some(ticket_id))
            .cloned())
    }
}
