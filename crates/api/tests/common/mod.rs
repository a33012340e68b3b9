#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use atrium_api::auth::jwt::{generate_access_token, JwtConfig};
use atrium_api::config::{BillingConfig, ServerConfig};
use atrium_api::router::build_app_router;
use atrium_api::state::AppState;
use atrium_billing::{BillingProvider, ProviderError, Subscription};
use atrium_core::signing::{signature_header, DEFAULT_TOLERANCE_SECS};
use atrium_core::types::DbId;
use atrium_db::MemoryStore;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "whsec_integration";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
        billing: BillingConfig {
            secret_key: "sk_test".to_string(),
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            price_id: "price_test".to_string(),
            api_base: "http://billing.invalid".to_string(),
            app_base_url: "http://localhost:5173".to_string(),
            webhook_tolerance_secs: DEFAULT_TOLERANCE_SECS,
        },
        deadline_utc_offset_minutes: 0,
    }
}

// ---------------------------------------------------------------------------
// Fake billing provider
// ---------------------------------------------------------------------------

/// Provider double: reports one active subscription when `active` is set.
#[derive(Default)]
pub struct FakeProvider {
    pub active: AtomicBool,
    pub fail: AtomicBool,
}

impl FakeProvider {
    fn check(&self) -> Result<(), ProviderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Api {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BillingProvider for FakeProvider {
    async fn list_active_subscriptions(
        &self,
        _customer_ref: &str,
        _limit: u32,
    ) -> Result<Vec<Subscription>, ProviderError> {
        self.check()?;
        if !self.active.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(vec![Subscription {
            id: "sub_test".into(),
            status: "active".into(),
            created: 1_700_000_000,
        }])
    }

    async fn create_customer(
        &self,
        user_id: DbId,
        _email: Option<&str>,
    ) -> Result<String, ProviderError> {
        self.check()?;
        Ok(format!("cus_{user_id}"))
    }

    async fn create_checkout_session(
        &self,
        customer_ref: &str,
        _user_id: DbId,
    ) -> Result<String, ProviderError> {
        self.check()?;
        Ok(format!("https://checkout.test/{customer_ref}"))
    }

    async fn create_portal_session(&self, customer_ref: &str) -> Result<String, ProviderError> {
        self.check()?;
        Ok(format!("https://portal.test/{customer_ref}"))
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<FakeProvider>,
}

/// Build the production router over an in-memory store and a fake provider.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(FakeProvider::default());
    let state = AppState::new(config, store.clone(), provider.clone());

    TestApp {
        router: build_app_router(state),
        store,
        provider,
    }
}

/// Bearer token for `user_id` signed with the test secret.
pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, &test_config().jwt).expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

pub async fn get_auth(router: &Router, uri: &str, user_id: DbId) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token_for(user_id)))
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

pub async fn post_json_auth(
    router: &Router,
    uri: &str,
    user_id: DbId,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token_for(user_id)))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

/// POST a raw webhook body with an optional signature header.
pub async fn post_webhook(
    router: &Router,
    payload: &[u8],
    signature: Option<String>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/billing/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    send(router, builder.body(Body::from(payload.to_vec())).unwrap()).await
}

/// Signature header for `payload` signed now with `secret`.
pub fn sign(secret: &str, payload: &[u8]) -> String {
    signature_header(secret, chrono::Utc::now().timestamp(), payload)
}
