//! Webhook error types.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors that occur while authenticating and decoding a webhook
/// delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature did not match the signing secret.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Delivery is older than the replay window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Delivery timestamp is in the future beyond clock-skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Signature header or payload could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

impl WebhookError {
    /// Returns true if the error means the delivery failed
    /// authentication (as opposed to being merely malformed).
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::InvalidSignature
                | WebhookError::TimestampOutOfRange
                | WebhookError::InvalidTimestamp
        )
    }
}

impl From<WebhookError> for DomainError {
    fn from(err: WebhookError) -> Self {
        let code = if err.is_authentication_failure() {
            // Fail closed: an unverifiable delivery is unauthenticated,
            // whatever the specific reason.
            ErrorCode::Unauthenticated
        } else {
            ErrorCode::InvalidArgument
        };
        DomainError::new(code, err.to_string())
    }
}
