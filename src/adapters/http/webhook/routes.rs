//! Axum router for the webhook endpoint.

use axum::routing::post;
use axum::Router;

use super::handlers::{handle_stripe_webhook, WebhookAppState};

/// Webhook routes, mounted under `/webhooks`.
///
/// # Routes
/// - `POST /stripe` - payment processor webhook deliveries
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Complete router with state applied.
pub fn webhook_router(state: WebhookAppState) -> Router {
    Router::new()
        .nest("/webhooks", webhook_routes())
        .with_state(state)
}
