//! Webhook domain: signature verification and event envelopes.

mod event;
mod signature;

pub use event::{
    CheckoutSession, CustomerDetails, EventKind, EventParseError, Invoice, Price, Subscription,
    SubscriptionItem, SubscriptionItems, WebhookEvent,
};
pub use signature::{payload_hash, SignatureHeader, SignatureVerifier, DEFAULT_TOLERANCE_SECS};
