//! PostgreSQL implementation of the event ledger.
//!
//! The unique constraint on `event_id` is the idempotency gate:
//! `INSERT ... ON CONFLICT DO NOTHING` with `rows_affected` distinguishes
//! first delivery from duplicate, including under concurrent deliveries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::ports::{EventLedger, EventOutcome, EventRecord, InsertOutcome, LedgerStatus};

use super::storage_error;

pub struct PostgresEventLedger {
    pool: PgPool,
}

impl PostgresEventLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    event_id: String,
    event_type: String,
    payload_hash: String,
    status: String,
    error: Option<String>,
    received_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl TryFrom<EventRow> for EventRecord {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status = LedgerStatus::parse(&row.status).ok_or_else(|| {
            DomainError::storage(format!("invalid ledger status value: {}", row.status))
        })?;
        Ok(EventRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            payload_hash: row.payload_hash,
            status,
            error: row.error,
            received_at: row.received_at,
            processed_at: row.processed_at,
        })
    }
}

#[async_trait]
impl EventLedger for PostgresEventLedger {
    async fn record_if_new(&self, record: EventRecord) -> Result<InsertOutcome, DomainError> {
        let result = sqlx::query(
            "INSERT INTO webhook_events (event_id, event_type, payload_hash, status, \
             error, received_at, processed_at) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(&record.payload_hash)
        .bind(record.status.as_str())
        .bind(&record.error)
        .bind(record.received_at)
        .bind(record.processed_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn mark_outcome(
        &self,
        event_id: &str,
        outcome: EventOutcome,
    ) -> Result<(), DomainError> {
        let (status, error) = match outcome {
            EventOutcome::Processed => (LedgerStatus::Processed, None),
            EventOutcome::Error(message) => (LedgerStatus::Error, Some(message)),
        };
        // The status guard keeps terminal records immutable.
        sqlx::query(
            "UPDATE webhook_events SET status = $2, error = $3, processed_at = $4 \
             WHERE event_id = $1 AND status = 'received'",
        )
        .bind(event_id)
        .bind(status.as_str())
        .bind(&error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn find(&self, event_id: &str) -> Result<Option<EventRecord>, DomainError> {
        let row: Option<EventRow> = sqlx::query_as(
            "SELECT event_id, event_type, payload_hash, status, error, received_at, \
             processed_at FROM webhook_events WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        row.map(EventRecord::try_from).transpose()
    }

    async fn reset_for_redrive(&self, event_id: &str) -> Result<bool, DomainError> {
        let result =
            sqlx::query("DELETE FROM webhook_events WHERE event_id = $1 AND status = 'error'")
                .bind(event_id)
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;
        Ok(result.rows_affected() > 0)
    }
}
