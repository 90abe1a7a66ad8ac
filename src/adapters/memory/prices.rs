//! In-memory price-config store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, EventId};
use crate::domain::pricing::EventPriceConfig;
use crate::ports::PriceStore;

/// Thread-safe in-memory implementation of [`PriceStore`].
#[derive(Default, Clone)]
pub struct InMemoryPriceStore {
    configs: Arc<RwLock<HashMap<EventId, EventPriceConfig>>>,
}

impl InMemoryPriceStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PriceStore for InMemoryPriceStore {
    async fn get(&self, event_id: &EventId) -> Result<Option<EventPriceConfig>, DomainError> {
        let configs = self.configs.read().await;
        Ok(configs.get(event_id).cloned())
    }

    async fn put(&self, config: &EventPriceConfig) -> Result<(), DomainError> {
        let mut configs = self.configs.write().await;
        configs.insert(config.event_id.clone(), config.clone());
        Ok(())
    }

    async fn delete(&self, event_id: &EventId) -> Result<(), DomainError> {
        let mut configs = self.configs.write().await;
        configs.remove(event_id);
        Ok(())
    }
}
