//! Port for the durable webhook event ledger.
//!
//! The ledger is the idempotency gate: one record per provider event ID,
//! inserted atomically before processing, with a single
//! `received -> processed | error` transition afterwards.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// Processing state of a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerStatus {
    Received,
    Processed,
    Error,
}

impl LedgerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStatus::Received => "received",
            LedgerStatus::Processed => "processed",
            LedgerStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "received" => Some(LedgerStatus::Received),
            "processed" => Some(LedgerStatus::Processed),
            "error" => Some(LedgerStatus::Error),
            _ => None,
        }
    }
}

/// One webhook delivery, keyed by the provider's event ID.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event_id: String,
    pub event_type: String,
    /// SHA-256 hex of the raw request body.
    pub payload_hash: String,
    pub status: LedgerStatus,
    pub error: Option<String>,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl EventRecord {
    /// A fresh record in the `received` state.
    pub fn received(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload_hash: impl Into<String>,
    ) -> Self {
        EventRecord {
            event_id: event_id.into(),
            event_type: event_type.into(),
            payload_hash: payload_hash.into(),
            status: LedgerStatus::Received,
            error: None,
            received_at: Utc::now(),
            processed_at: None,
        }
    }
}

/// Result of the atomic insert-if-new gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// First delivery; the caller owns processing.
    Inserted,
    /// A record with this event ID already exists; skip processing.
    AlreadyExists,
}

/// Terminal outcome reported after processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Processed,
    Error(String),
}

#[async_trait]
pub trait EventLedger: Send + Sync {
    /// Inserts the record unless one with the same event ID exists.
    /// First writer wins; concurrent duplicates observe `AlreadyExists`.
    async fn record_if_new(&self, record: EventRecord) -> Result<InsertOutcome, DomainError>;

    /// Records the terminal outcome of a `received` event. Records already
    /// in a terminal state are left untouched.
    async fn mark_outcome(
        &self,
        event_id: &str,
        outcome: EventOutcome,
    ) -> Result<(), DomainError>;

    async fn find(&self, event_id: &str) -> Result<Option<EventRecord>, DomainError>;

    /// Operator re-drive: removes an `error` record so the next delivery
    /// of the event passes the idempotency gate and is processed again.
    /// Returns `true` when a record was cleared; `processed` records are
    /// immutable.
    async fn reset_for_redrive(&self, event_id: &str) -> Result<bool, DomainError>;
}
