//! Webhook delivery pipeline: verify, parse, ledger gate, process.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::webhook::{payload_hash, SignatureVerifier, WebhookEvent};
use crate::ports::{
    AuditLevel, AuditLog, EventLedger, EventOutcome, EventRecord, InsertOutcome,
};

use super::processor::EventProcessor;

/// How a delivery was dealt with; the HTTP adapter maps this onto status
/// codes and response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// Verified, recorded, and fully processed.
    Processed,
    /// A ledger record for this event ID already existed.
    Duplicate,
    InvalidSignature,
    InvalidPayload,
    /// Recorded, but processing or bookkeeping failed; the provider should
    /// retry (the retry is absorbed as a duplicate until re-driven).
    Failed,
}

pub struct ProcessWebhookHandler {
    verifier: SignatureVerifier,
    ledger: Arc<dyn EventLedger>,
    processor: Arc<EventProcessor>,
    audit: Arc<dyn AuditLog>,
}

impl ProcessWebhookHandler {
    pub fn new(
        verifier: SignatureVerifier,
        ledger: Arc<dyn EventLedger>,
        processor: Arc<EventProcessor>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            verifier,
            ledger,
            processor,
            audit,
        }
    }

    /// Runs one raw delivery through the pipeline.
    ///
    /// Order matters: the signature is checked before the body is parsed,
    /// and the ledger record is inserted before any side effect so a crash
    /// mid-processing cannot double-apply the event.
    pub async fn handle(&self, payload: &[u8], signature_header: &str) -> WebhookDisposition {
        if !self.verifier.verify(payload, signature_header) {
            tracing::warn!("webhook signature verification failed");
            return WebhookDisposition::InvalidSignature;
        }

        let event = match WebhookEvent::parse(payload) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "webhook payload rejected");
                return WebhookDisposition::InvalidPayload;
            }
        };

        let record = EventRecord::received(
            event.id.clone(),
            event.event_type.clone(),
            payload_hash(payload),
        );
        match self.ledger.record_if_new(record).await {
            Ok(InsertOutcome::Inserted) => {}
            Ok(InsertOutcome::AlreadyExists) => {
                tracing::info!(event_id = %event.id, "duplicate webhook delivery ignored");
                return WebhookDisposition::Duplicate;
            }
            Err(err) => {
                tracing::error!(event_id = %event.id, error = %err, "event ledger insert failed");
                return WebhookDisposition::Failed;
            }
        }

        match self.processor.process(&event).await {
            Ok(()) => match self
                .ledger
                .mark_outcome(&event.id, EventOutcome::Processed)
                .await
            {
                Ok(()) => WebhookDisposition::Processed,
                Err(err) => {
                    tracing::error!(event_id = %event.id, error = %err, "failed to mark event processed");
                    WebhookDisposition::Failed
                }
            },
            Err(err) => {
                tracing::error!(event_id = %event.id, error = %err, "webhook processing failed");
                if let Err(audit_err) = self
                    .audit
                    .append(
                        AuditLevel::Error,
                        &format!("Webhook processing failed: {err}"),
                        None,
                        Some(serde_json::json!({
                            "event_id": event.id,
                            "event_type": event.event_type,
                        })),
                    )
                    .await
                {
                    tracing::error!(error = %audit_err, "audit append failed");
                }
                if let Err(mark_err) = self
                    .ledger
                    .mark_outcome(&event.id, EventOutcome::Error(err.to_string()))
                    .await
                {
                    tracing::error!(event_id = %event.id, error = %mark_err, "failed to mark event errored");
                }
                WebhookDisposition::Failed
            }
        }
    }

    /// Operator re-drive of an errored event; see
    /// [`EventLedger::reset_for_redrive`].
    pub async fn reset_event(&self, event_id: &str) -> Result<bool, DomainError> {
        self.ledger.reset_for_redrive(event_id).await
    }
}
