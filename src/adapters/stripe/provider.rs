//! Stripe payment provider adapter.
//!
//! Implements [`PaymentProvider`] against the Stripe PaymentIntents API.
//!
//! # Security
//!
//! - API key held as `secrecy::SecretString`, sent via basic auth
//! - Every call bounded by the configured client timeout; a slow
//!   provider surfaces as a retryable network error, never a hang

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::PaymentConfig;
use crate::ports::{
    CreateIntentRequest, PaymentIntent, PaymentProvider, ProviderError, ProviderErrorCode,
};

use super::types::StripePaymentIntent;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Configuration for the Stripe adapter.
#[derive(Clone)]
pub struct StripeProviderConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the Stripe API.
    api_base_url: String,

    /// Upper bound on any single API call.
    request_timeout: Duration,
}

impl StripeProviderConfig {
    /// Creates a configuration with the default API endpoint.
    pub fn new(api_key: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout,
        }
    }

    /// Builds the adapter configuration from validated payment config.
    pub fn from_payment_config(config: &PaymentConfig) -> Self {
        Self::new(
            config.stripe_api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Overrides the API base URL (for testing against a stub server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe implementation of [`PaymentProvider`].
pub struct StripeIntentProvider {
    config: StripeProviderConfig,
    http_client: reqwest::Client,
}

impl StripeIntentProvider {
    /// Creates the adapter, building an HTTP client with the configured
    /// timeout.
    pub fn new(config: StripeProviderConfig) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                ProviderError::new(ProviderErrorCode::Unknown, format!("http client: {}", e))
            })?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

/// Flattens a create-intent request into Stripe's form encoding.
fn intent_params(request: &CreateIntentRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("amount".to_string(), request.amount_minor_units.to_string()),
        ("currency".to_string(), request.currency.clone()),
    ];
    for (key, value) in &request.metadata {
        params.push((format!("metadata[{}]", key), value.clone()));
    }
    params.sort();
    params
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network(format!("request timed out: {}", e))
    } else {
        ProviderError::network(e.to_string())
    }
}

#[async_trait]
impl PaymentProvider for StripeIntentProvider {
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, ProviderError> {
        let url = format!("{}/v1/payment_intents", self.config.api_base_url);
        let params = intent_params(&request);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication("Stripe rejected the API key"));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::new(
                ProviderErrorCode::RateLimitExceeded,
                "Stripe rate limit exceeded",
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %body, "Stripe create_intent failed");
            return Err(ProviderError::api(format!(
                "Stripe API error ({}): {}",
                status, body
            )));
        }

        let intent: StripePaymentIntent = response
            .json()
            .await
            .map_err(|e| ProviderError::api(format!("unparseable Stripe response: {}", e)))?;

        tracing::debug!(intent_id = %intent.id, status = %intent.status, "created payment intent");
        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}
