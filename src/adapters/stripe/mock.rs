//! Mock payment provider for tests and local development.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::ports::{
    CreateIntentRequest, PaymentIntent, PaymentProvider, ProviderError, ProviderErrorCode,
};

/// Deterministic in-process [`PaymentProvider`].
///
/// Issues sequential `pi_mock_N` ids and records every request so tests
/// can assert on what would have been sent to the real provider.
#[derive(Default)]
pub struct MockPaymentProvider {
    counter: AtomicU64,
    requests: Mutex<Vec<CreateIntentRequest>>,
    fail_with: Option<ProviderErrorCode>,
}

impl MockPaymentProvider {
    /// Creates a provider that succeeds on every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that fails every call with the given code.
    pub fn failing(code: ProviderErrorCode) -> Self {
        Self {
            fail_with: Some(code),
            ..Self::default()
        }
    }

    /// Number of intent-creation calls received.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Copies of every request received.
    pub fn requests(&self) -> Vec<CreateIntentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, ProviderError> {
        self.requests.lock().unwrap().push(request);

        if let Some(code) = self.fail_with {
            return Err(ProviderError::new(code, "mock provider failure"));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PaymentIntent {
            id: format!("pi_mock_{}", n),
            client_secret: Some(format!("pi_mock_{}_secret", n)),
        })
    }
}
