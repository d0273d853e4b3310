//! Integration test harness for the Tool Market server.
//!
//! Tests drive the real router from [`tool_market_server::app`] with
//! `tower::ServiceExt::oneshot`, over the in-memory store and a fake payment
//! processor, so no database or network is needed.
//!
//! ```bash
//! cargo test -p tool-market-integration-tests
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::Mutex;
use tool_market_core::{Email, Role};
use tool_market_server::config::{SentryConfig, ServerConfig, StorageConfig};
use tool_market_server::db::{MemoryStore, Store};
use tool_market_server::models::UserUpdate;
use tool_market_server::services::{PaymentError, PaymentProcessor, TokenService};
use tool_market_server::state::AppState;
use tower::ServiceExt;

/// Token secret used by every test app.
pub const TEST_SECRET: &str = "Xk9#mP2$vL7qR4@wN8zT1&yB5^cH3!fJ";

/// Payment processor that records calls and returns a predictable secret.
#[derive(Debug, Default)]
pub struct FakeProcessor {
    calls: Mutex<Vec<(i64, String)>>,
}

impl FakeProcessor {
    /// `(amount_minor, currency)` of every intent created so far.
    pub async fn calls(&self) -> Vec<(i64, String)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<String, PaymentError> {
        self.calls
            .lock()
            .await
            .push((amount_minor, currency.to_owned()));
        Ok(format!("pi_test_{amount_minor}_secret"))
    }
}

/// A decoded response: status, headers and JSON body.
///
/// Plain-text bodies are returned as a JSON string.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

/// A router over a fresh in-memory store.
pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    tokens: TokenService,
    pub payments: Arc<FakeProcessor>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let config = ServerConfig {
            storage: StorageConfig::Memory,
            host: std::net::IpAddr::from([127, 0, 0, 1]),
            port: 0,
            token_secret: SecretString::from(TEST_SECRET.to_owned()),
            stripe_secret_key: None,
            sentry: SentryConfig::default(),
        };
        let store = Arc::new(MemoryStore::new());
        let payments = Arc::new(FakeProcessor::default());
        let tokens = TokenService::new(&config.token_secret);
        let state = AppState::new(config, store.clone(), payments.clone());

        Self {
            router: tool_market_server::app(state),
            store,
            tokens,
            payments,
        }
    }

    /// Direct access to the backing store.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// A valid token for `email`, as `PUT /user/{email}` would issue.
    ///
    /// # Panics
    ///
    /// Panics if `email` is not a valid address.
    #[must_use]
    pub fn token_for(&self, email: &str) -> String {
        let email = Email::parse(email).expect("test email must be valid");
        self.tokens.sign(&email).expect("signing must succeed")
    }

    /// Register `email` with the given role and return a token for it.
    ///
    /// # Panics
    ///
    /// Panics if the store rejects the write.
    pub async fn register(&self, email: &str, role: Role) -> String {
        let parsed = Email::parse(email).expect("test email must be valid");
        self.store
            .upsert_user(&parsed, UserUpdate::default())
            .await
            .expect("upsert must succeed");
        self.store
            .set_role(&parsed, role)
            .await
            .expect("set_role must succeed");
        self.token_for(email)
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).expect("request must build"))
            .await
    }

    /// Send a pre-built request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the body cannot be read.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body must be readable")
            .to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        self.request(Method::PATCH, uri, token, body).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }
}

/// A token for `email` signed with a different secret.
///
/// # Panics
///
/// Panics if `email` is not a valid address.
#[must_use]
pub fn foreign_token(email: &str) -> String {
    let other = TokenService::new(&SecretString::from("Qw8!eR3@tY6#uI9$oP2%aS5^dF1&gH4*".to_owned()));
    other
        .sign(&Email::parse(email).expect("test email must be valid"))
        .expect("signing must succeed")
}

/// An already expired token for `email`, signed with [`TEST_SECRET`].
///
/// # Panics
///
/// Panics if `email` is not a valid address.
#[must_use]
pub fn expired_token(email: &str) -> String {
    let tokens = TokenService::with_ttl(
        &SecretString::from(TEST_SECRET.to_owned()),
        chrono::Duration::seconds(-120),
    );
    tokens
        .sign(&Email::parse(email).expect("test email must be valid"))
        .expect("signing must succeed")
}
