use atrium_billing::stripe::DEFAULT_API_BASE;
use atrium_billing::StripeConfig;
use atrium_core::deadlines::ReferenceZone;
use atrium_core::signing::DEFAULT_TOLERANCE_SECS;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT validation settings.
    pub jwt: JwtConfig,
    /// Billing provider settings.
    pub billing: BillingConfig,
    /// Offset of the reference timezone for deadline days, in minutes east
    /// of UTC (default: `0`).
    pub deadline_utc_offset_minutes: i32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                    |
    /// |--------------------------------|----------------------------|
    /// | `HOST`                         | `0.0.0.0`                  |
    /// | `PORT`                         | `3000`                     |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                       |
    /// | `DEADLINE_UTC_OFFSET_MINUTES`  | `0`                        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let deadline_utc_offset_minutes: i32 = std::env::var("DEADLINE_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("DEADLINE_UTC_OFFSET_MINUTES must be a valid i32");

        let config = Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            billing: BillingConfig::from_env(),
            deadline_utc_offset_minutes,
        };
        // Fail at startup rather than on the first deadline run.
        config.deadline_zone();
        config
    }

    /// The fixed zone in which deadline calendar days are evaluated.
    ///
    /// # Panics
    ///
    /// Panics if the configured offset is outside +/- 24 hours.
    pub fn deadline_zone(&self) -> ReferenceZone {
        ReferenceZone::from_offset_minutes(self.deadline_utc_offset_minutes)
            .expect("DEADLINE_UTC_OFFSET_MINUTES must be within +/- 1439")
    }
}

/// Billing provider configuration.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Provider secret API key.
    pub secret_key: String,
    /// Webhook signing secret. Without it every push event is rejected.
    pub webhook_secret: Option<String>,
    /// Price the checkout subscribes to.
    pub price_id: String,
    /// Provider API base URL.
    pub api_base: String,
    /// Public URL of the web app, used for checkout and portal return links.
    pub app_base_url: String,
    /// Maximum age of a signed webhook, in seconds.
    pub webhook_tolerance_secs: i64,
}

impl BillingConfig {
    /// Load billing configuration from environment variables.
    ///
    /// | Env Var                          | Required | Default                   |
    /// |----------------------------------|----------|---------------------------|
    /// | `BILLING_SECRET_KEY`             | **yes**  | --                        |
    /// | `BILLING_WEBHOOK_SECRET`         | no       | unset (webhooks rejected) |
    /// | `BILLING_PRICE_ID`               | **yes**  | --                        |
    /// | `BILLING_API_BASE`               | no       | `https://api.stripe.com`  |
    /// | `APP_BASE_URL`                   | no       | `http://localhost:5173`   |
    /// | `BILLING_WEBHOOK_TOLERANCE_SECS` | no       | `300`                     |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or a number fails to parse.
    pub fn from_env() -> Self {
        let secret_key = std::env::var("BILLING_SECRET_KEY")
            .expect("BILLING_SECRET_KEY must be set in the environment");

        let webhook_secret = std::env::var("BILLING_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());
        if webhook_secret.is_none() {
            tracing::warn!("BILLING_WEBHOOK_SECRET is not set; billing webhooks will be rejected");
        }

        let price_id =
            std::env::var("BILLING_PRICE_ID").expect("BILLING_PRICE_ID must be set in the environment");

        let api_base =
            std::env::var("BILLING_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());

        let app_base_url =
            std::env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:5173".into());

        let webhook_tolerance_secs: i64 = std::env::var("BILLING_WEBHOOK_TOLERANCE_SECS")
            .unwrap_or_else(|_| DEFAULT_TOLERANCE_SECS.to_string())
            .parse()
            .expect("BILLING_WEBHOOK_TOLERANCE_SECS must be a valid i64");

        Self {
            secret_key,
            webhook_secret,
            price_id,
            api_base,
            app_base_url,
            webhook_tolerance_secs,
        }
    }

    /// Connection settings for the provider client.
    pub fn stripe_config(&self) -> StripeConfig {
        StripeConfig {
            secret_key: self.secret_key.clone(),
            price_id: self.price_id.clone(),
            api_base: self.api_base.clone(),
            app_base_url: self.app_base_url.clone(),
        }
    }
}
