//! HTTP handler for webhook deliveries.
//!
//! The endpoint takes the raw body; signature verification needs the exact
//! bytes the provider signed, so no JSON extractor sits in front of it.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::{ProcessWebhookHandler, WebhookDisposition};

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub webhook_handler: Arc<ProcessWebhookHandler>,
}

/// `POST /webhooks/stripe`
///
/// No user authentication; deliveries authenticate by signature. The
/// response bodies are part of the contract with the provider's retry
/// logic: 2xx acknowledges (including duplicates), 400 rejects without
/// retry, 500 asks for a retry.
pub async fn handle_stripe_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    match state.webhook_handler.handle(&body, signature).await {
        WebhookDisposition::Processed => (StatusCode::OK, "OK"),
        WebhookDisposition::Duplicate => (StatusCode::OK, "Duplicate event ignored."),
        WebhookDisposition::InvalidSignature => {
            (StatusCode::BAD_REQUEST, "signature verification failed")
        }
        WebhookDisposition::InvalidPayload => {
            (StatusCode::BAD_REQUEST, "payload could not be parsed")
        }
        WebhookDisposition::Failed => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Webhook processing error.")
        }
    }
}
