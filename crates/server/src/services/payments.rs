//! Payment processor client.
//!
//! Only one call is needed: creating a card payment intent whose client
//! secret the browser uses to complete the charge. Confirmation comes back
//! through `PATCH /orders/{id}` with the resulting transaction id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Per-request timeout for processor calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when talking to the payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No processor credentials configured.
    #[error("payment processor not configured")]
    NotConfigured,
}

/// Creates payment intents with an external processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a card payment intent for `amount_minor` units of `currency`
    /// and return its client secret.
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<String, PaymentError>;
}

/// Stripe REST API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the secret key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(secret_key: &SecretString) -> Result<Self, PaymentError> {
        Self::with_base_url(secret_key, BASE_URL)
    }

    /// Create a client against a different API host (e.g. a local mock).
    ///
    /// # Errors
    ///
    /// See [`StripeClient::new`].
    pub fn with_base_url(
        secret_key: &SecretString,
        base_url: impl Into<String>,
    ) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();
        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", secret_key.expose_secret()))
                .map_err(|e| PaymentError::Parse(format!("Invalid secret key format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<String, PaymentError> {
        let url = format!("{}/payment_intents", self.base_url);
        let amount = amount_minor.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("payment_method_types[]", "card"),
        ];

        let response = self.client.post(&url).form(&form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        intent
            .client_secret
            .ok_or_else(|| PaymentError::Parse("payment intent has no client_secret".to_owned()))
    }
}

/// Processor used when no secret key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledProcessor;

#[async_trait]
impl PaymentProcessor for DisabledProcessor {
    async fn create_payment_intent(
        &self,
        _amount_minor: i64,
        _currency: &str,
    ) -> Result<String, PaymentError> {
        Err(PaymentError::NotConfigured)
    }
}
