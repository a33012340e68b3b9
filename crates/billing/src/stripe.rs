//! HTTP client for a Stripe-compatible billing API.
//!
//! Requests are form-encoded and authenticated with the secret key as a
//! bearer token. Only the four calls behind [`BillingProvider`] are wrapped.

use std::time::Duration;

use async_trait::async_trait;
use atrium_core::notification::BILLING_LINK;
use atrium_core::types::DbId;
use serde::Deserialize;

use crate::provider::{BillingProvider, ProviderError, Subscription};

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// HTTP request timeout for a single provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for [`StripeClient`].
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key.
    pub secret_key: String,
    /// Price the checkout session subscribes to.
    pub price_id: String,
    /// API base URL, without a trailing slash.
    pub api_base: String,
    /// Public URL of the web app; checkout and portal return here.
    pub app_base_url: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UrlResponse {
    url: Option<String>,
}

/// Billing provider client.
pub struct StripeClient {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self::with_client(client, config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: StripeConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base.trim_end_matches('/'))
    }

    fn return_url(&self, query: &str) -> String {
        format!(
            "{}{BILLING_LINK}{query}",
            self.config.app_base_url.trim_end_matches('/')
        )
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.secret_key)
            .form(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Subscriptions fetched per lookup. The provider's `status` filter takes a
/// single value, so `active` and `trialing` are both selected client-side.
const SUBSCRIPTION_PAGE_SIZE: u32 = 20;

/// Keep subscriptions that count as paid evidence, at most `limit` of them.
fn active_only(subscriptions: Vec<Subscription>, limit: u32) -> Vec<Subscription> {
    subscriptions
        .into_iter()
        .filter(Subscription::is_active)
        .take(limit as usize)
        .collect()
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn list_active_subscriptions(
        &self,
        customer_ref: &str,
        limit: u32,
    ) -> Result<Vec<Subscription>, ProviderError> {
        let response = self
            .client
            .get(self.url("/v1/subscriptions"))
            .bearer_auth(&self.config.secret_key)
            .query(&[
                ("customer", customer_ref.to_string()),
                ("limit", SUBSCRIPTION_PAGE_SIZE.to_string()),
            ])
            .send()
            .await?;

        let list: ListResponse<Subscription> = Self::parse_response(response).await?;
        Ok(active_only(list.data, limit))
    }

    async fn create_customer(
        &self,
        user_id: DbId,
        email: Option<&str>,
    ) -> Result<String, ProviderError> {
        let mut form = vec![("metadata[user_id]", user_id.to_string())];
        if let Some(email) = email {
            form.push(("email", email.to_string()));
        }

        let customer: IdResponse = self.post_form("/v1/customers", &form).await?;
        Ok(customer.id)
    }

    async fn create_checkout_session(
        &self,
        customer_ref: &str,
        user_id: DbId,
    ) -> Result<String, ProviderError> {
        let user_id = user_id.to_string();
        let form = [
            ("mode", "subscription".to_string()),
            ("customer", customer_ref.to_string()),
            ("client_reference_id", user_id.clone()),
            ("metadata[user_id]", user_id.clone()),
            ("subscription_data[metadata][user_id]", user_id),
            ("line_items[0][price]", self.config.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", self.return_url("?checkout=success")),
            ("cancel_url", self.return_url("?checkout=cancelled")),
        ];

        let session: UrlResponse = self.post_form("/v1/checkout/sessions", &form).await?;
        session.url.ok_or(ProviderError::MissingField("url"))
    }

    async fn create_portal_session(&self, customer_ref: &str) -> Result<String, ProviderError> {
        let form = [
            ("customer", customer_ref.to_string()),
            ("return_url", self.return_url("")),
        ];

        let session: UrlResponse = self.post_form("/v1/billing_portal/sessions", &form).await?;
        session.url.ok_or(ProviderError::MissingField("url"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
