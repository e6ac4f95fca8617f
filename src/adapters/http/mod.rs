//! HTTP adapters (axum).

pub mod webhook;

pub use webhook::{webhook_router, WebhookAppState};
