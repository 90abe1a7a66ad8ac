//! Payment provider port.
//!
//! The engine consumes exactly one provider operation: creating a charge
//! intent sized to a ledger entry. Everything else the provider does
//! (its own ledger, retries, settlement) stays on its side of the
//! boundary; outcomes come back asynchronously as signed webhooks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Request to create a charge intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIntentRequest {
    pub amount_minor_units: i64,
    pub currency: String,
    /// Opaque key/value pairs echoed back by the provider (the engine
    /// stores the donation id here).
    pub metadata: HashMap<String, String>,
}

/// An authorized-but-not-yet-settled charge reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider-assigned intent id.
    pub id: String,
    /// Client-side confirmation secret, when the provider issues one.
    pub client_secret: Option<String>,
}

/// Port for payment provider integrations.
///
/// `create_intent` must be safe to call repeatedly for the same ledger
/// entry: the ledger's attach guard makes the *composition* idempotent,
/// so implementations only need to be honest about failures.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a charge intent with the provider.
    ///
    /// Implementations must bound the call with a timeout; a slow
    /// provider surfaces as a retryable error, never a hang.
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, ProviderError>;
}

/// Error codes for provider operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorCode {
    /// Network connectivity failure or timeout.
    NetworkError,
    /// API credentials rejected.
    AuthenticationError,
    /// Provider asked us to back off.
    RateLimitExceeded,
    /// Provider rejected the request or returned garbage.
    ProviderError,
    /// Anything else.
    Unknown,
}

impl ProviderErrorCode {
    /// Returns true if the operation is worth retrying as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorCode::NetworkError | ProviderErrorCode::RateLimitExceeded
        )
    }
}

/// Error from a provider operation.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationError, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ProviderError, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for DomainError {
    fn from(err: ProviderError) -> Self {
        let code = if err.is_retryable() {
            ErrorCode::Unavailable
        } else {
            // Credential or contract problems on our side of the call
            // are not the caller's to retry.
            ErrorCode::Internal
        };
        DomainError::new(code, format!("Payment provider: {}", err.message))
    }
}
