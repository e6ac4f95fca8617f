//! Service entry point: configuration, wiring, and the webhook server.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use vendor_billing::adapters::http::{webhook_router, WebhookAppState};
use vendor_billing::adapters::memory::{InMemoryUserDirectory, RecordingNotifier};
use vendor_billing::adapters::postgres::{
    PostgresAuditLog, PostgresEventLedger, PostgresVendorRepository,
};
use vendor_billing::application::{
    EventProcessor, Mailer, ProcessWebhookHandler, StatusReconciler, VendorDirectory,
};
use vendor_billing::config::AppConfig;
use vendor_billing::domain::webhook::SignatureVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    config.validate()?;
    tracing::info!(test_mode = config.billing.is_test_mode(), "configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let vendors = Arc::new(PostgresVendorRepository::new(pool.clone()));
    let ledger = Arc::new(PostgresEventLedger::new(pool.clone()));
    let audit = Arc::new(PostgresAuditLog::new(pool));

    // The production deployment plugs the host platform's directory and
    // mail transport in here; out of the box the service runs against the
    // in-process implementations.
    let users = Arc::new(InMemoryUserDirectory::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let mailer = Arc::new(Mailer::new(
        notifier,
        audit.clone(),
        config.notifications.clone(),
    ));
    let directory = Arc::new(VendorDirectory::new(
        vendors.clone(),
        users.clone(),
        audit.clone(),
        mailer.clone(),
    ));
    let reconciler = Arc::new(StatusReconciler::new(vendors, users, audit.clone(), mailer));
    let processor = Arc::new(EventProcessor::new(
        directory,
        reconciler,
        audit.clone(),
        config.billing.price_map()?,
    ));
    let webhook_handler = Arc::new(ProcessWebhookHandler::new(
        SignatureVerifier::new(
            config.billing.stripe_webhook_secret.clone(),
            config.billing.signature_tolerance_secs,
        ),
        ledger,
        processor,
        audit,
    ));

    let app = webhook_router(WebhookAppState { webhook_handler }).layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "webhook server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
