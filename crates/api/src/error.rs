use atrium_billing::BillingError;
use atrium_core::error::CoreError;
use atrium_db::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain, store and billing errors. Implements [`IntoResponse`]
/// to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Billing(#[from] BillingError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type ErrorParts = (StatusCode, &'static str, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Store(store) => classify_store_error(store),
            AppError::Billing(billing) => classify_billing_error(billing),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> ErrorParts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(err: &CoreError) -> ErrorParts {
    match err {
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
    }
}

fn classify_store_error(err: &StoreError) -> ErrorParts {
    match err {
        StoreError::Database(db) => classify_sqlx_error(db),
        StoreError::Unavailable(msg) => {
            tracing::error!(error = %msg, "Store unavailable");
            internal()
        }
    }
}

/// Signature problems are 401 so the provider sees an authentication
/// failure; a verified but malformed body is 400.
fn classify_billing_error(err: &BillingError) -> ErrorParts {
    if err.is_authentication() {
        tracing::warn!(error = %err, "Rejected billing webhook");
        return (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE", err.to_string());
    }
    match err {
        BillingError::InvalidPayload(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        BillingError::Core(core) => classify_core_error(core),
        BillingError::Store(store) => classify_store_error(store),
        BillingError::Provider(provider) => {
            tracing::error!(error = %provider, "Billing provider error");
            (
                StatusCode::BAD_GATEWAY,
                "BILLING_PROVIDER_ERROR",
                "The billing provider could not be reached".to_string(),
            )
        }
        _ => internal(),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> ErrorParts {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
