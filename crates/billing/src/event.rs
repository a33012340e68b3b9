//! Parsing of verified webhook payloads.
//!
//! Only the fields the reconciler acts on are extracted. Unknown event
//! types parse successfully into [`BillingEvent::Ignored`] so the endpoint
//! can acknowledge them.

use atrium_core::types::DbId;
use serde::Deserialize;
use serde_json::Value;

use crate::error::BillingError;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const SUBSCRIPTION_CREATED: &str = "customer.subscription.created";
pub const SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
pub const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";

/// Metadata keys that may carry our user ID, in lookup order.
const USER_ID_METADATA_KEYS: [&str; 2] = ["user_id", "userId"];

/// A provider event reduced to what the reconciler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    /// A hosted checkout finished; the customer now has a subscription.
    CheckoutCompleted {
        user_id: Option<DbId>,
        customer_ref: Option<String>,
    },
    /// A subscription was created or changed status.
    SubscriptionChanged {
        user_id: Option<DbId>,
        customer_ref: Option<String>,
        status: String,
    },
    /// A subscription ended.
    SubscriptionDeleted {
        user_id: Option<DbId>,
        customer_ref: Option<String>,
    },
    /// Any event type the reconciler does not act on.
    Ignored { event_type: String },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: Value,
}

impl BillingEvent {
    /// Parse a raw (already verified) payload.
    pub fn parse(payload: &[u8]) -> Result<(String, Self), BillingError> {
        let envelope: Envelope = serde_json::from_slice(payload)
            .map_err(|e| BillingError::InvalidPayload(e.to_string()))?;
        let object = &envelope.data.object;

        let event = match envelope.event_type.as_str() {
            CHECKOUT_COMPLETED => BillingEvent::CheckoutCompleted {
                user_id: user_id_from_metadata(object)
                    .or_else(|| parse_user_id(object.get("client_reference_id"))),
                customer_ref: customer_ref(object),
            },
            SUBSCRIPTION_CREATED | SUBSCRIPTION_UPDATED => BillingEvent::SubscriptionChanged {
                user_id: user_id_from_metadata(object),
                customer_ref: customer_ref(object),
                status: object
                    .get("status")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            SUBSCRIPTION_DELETED => BillingEvent::SubscriptionDeleted {
                user_id: user_id_from_metadata(object),
                customer_ref: customer_ref(object),
            },
            other => BillingEvent::Ignored {
                event_type: other.to_string(),
            },
        };

        Ok((envelope.event_type, event))
    }
}

fn user_id_from_metadata(object: &Value) -> Option<DbId> {
    let metadata = object.get("metadata")?;
    USER_ID_METADATA_KEYS
        .iter()
        .find_map(|key| parse_user_id(metadata.get(*key)))
}

/// Accept the ID as a JSON number or a numeric string.
fn parse_user_id(value: Option<&Value>) -> Option<DbId> {
    let id = match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0)
}

/// The customer may arrive as an ID string or an expanded object.
fn customer_ref(object: &Value) -> Option<String> {
    match object.get("customer")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(o) => o.get("id").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
