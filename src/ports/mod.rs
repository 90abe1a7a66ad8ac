//! Ports - interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the engine and the outside world. Adapters implement these ports.
//!
//! - `LedgerStore` / `PriceStore` - key-addressed record stores; the
//!   ledger store's conditional write carries the whole concurrency model
//! - `PaymentProvider` - external charge-intent creation

mod ledger_store;
mod payment_provider;
mod price_store;

pub use ledger_store::{LedgerStore, WriteOutcome};
pub use payment_provider::{
    CreateIntentRequest, PaymentIntent, PaymentProvider, ProviderError, ProviderErrorCode,
};
pub use price_store::PriceStore;
