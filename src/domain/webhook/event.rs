//! Webhook event envelope and typed payload views.
//!
//! The envelope keeps only what processing needs: the provider event ID,
//! the event type string, and the `data.object` payload. Payload views are
//! lenient by design. Provider objects carry many fields we do not read,
//! and absent fields simply stay `None`.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// Reasons a raw body is not a usable event.
#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event has no id")]
    MissingId,
}

/// Event types this service acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    CheckoutSessionCompleted,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    InvoicePaid,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    Unknown,
}

impl EventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => EventKind::CheckoutSessionCompleted,
            "customer.subscription.created" => EventKind::SubscriptionCreated,
            "customer.subscription.updated" => EventKind::SubscriptionUpdated,
            "customer.subscription.deleted" => EventKind::SubscriptionDeleted,
            "invoice.paid" => EventKind::InvoicePaid,
            "invoice.payment_succeeded" => EventKind::InvoicePaymentSucceeded,
            "invoice.payment_failed" => EventKind::InvoicePaymentFailed,
            _ => EventKind::Unknown,
        }
    }
}

/// Parsed webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type", default = "unknown_type")]
    pub event_type: String,
    #[serde(default)]
    data: EventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EventData {
    #[serde(default)]
    object: serde_json::Value,
}

fn unknown_type() -> String {
    "unknown".to_string()
}

impl WebhookEvent {
    /// Parses a raw body into an event. The body must be JSON carrying a
    /// non-empty string `id`; `type` defaults to `"unknown"` and
    /// `data.object` to an empty object.
    pub fn parse(payload: &[u8]) -> Result<Self, EventParseError> {
        let event: WebhookEvent = serde_json::from_slice(payload)?;
        if event.id.is_empty() {
            return Err(EventParseError::MissingId);
        }
        Ok(event)
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from_type(&self.event_type)
    }

    /// Deserializes `data.object` into a payload view. Objects that do not
    /// fit the view at all collapse to the view's default.
    pub fn object<T: DeserializeOwned + Default>(&self) -> T {
        serde_json::from_value(self.data.object.clone()).unwrap_or_default()
    }
}

/// `checkout.session.completed` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSession {
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub customer_email: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub payment_status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl CheckoutSession {
    /// Purchaser email: `customer_details.email`, else `customer_email`.
    pub fn email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .or(self.customer_email.as_deref())
            .filter(|e| !e.is_empty())
    }

    /// Organization name: `customer_details.name`, else `metadata.org_name`.
    pub fn org_name(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.name.as_deref())
            .or_else(|| self.metadata.get("org_name").map(String::as_str))
            .filter(|n| !n.is_empty())
    }

    /// Whether the session's payment has settled.
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

/// `customer.subscription.*` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subscription {
    pub id: Option<String>,
    pub customer: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub items: SubscriptionItems,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItem {
    pub price: Option<Price>,
}

/// Price attached to a subscription item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Price {
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Subscription {
    /// The first item's price; subscriptions here carry a single plan item.
    pub fn first_price(&self) -> Option<&Price> {
        self.items.data.first().and_then(|item| item.price.as_ref())
    }
}

/// `invoice.*` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Invoice {
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub status: Option<String>,
}
