//! Webhook domain - authenticity and decoding of provider deliveries.

mod errors;
mod event;
mod verifier;

pub use errors::WebhookError;
pub use event::{ProviderEvent, ProviderEventData, ProviderEventKind};
pub use verifier::{SignatureHeader, WebhookVerifier};
