//! In-memory event ledger.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::{EventLedger, EventOutcome, EventRecord, InsertOutcome, LedgerStatus};

#[derive(Default)]
pub struct InMemoryEventLedger {
    records: RwLock<HashMap<String, EventRecord>>,
}

impl InMemoryEventLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventLedger for InMemoryEventLedger {
    async fn record_if_new(&self, record: EventRecord) -> Result<InsertOutcome, DomainError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.event_id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        records.insert(record.event_id.clone(), record);
        Ok(InsertOutcome::Inserted)
    }

    async fn mark_outcome(
        &self,
        event_id: &str,
        outcome: EventOutcome,
    ) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(event_id) else {
            return Err(DomainError::not_found("event record"));
        };
        // Terminal states stay put.
        if record.status != LedgerStatus::Received {
            return Ok(());
        }
        match outcome {
            EventOutcome::Processed => {
                record.status = LedgerStatus::Processed;
                record.error = None;
            }
            EventOutcome::Error(message) => {
                record.status = LedgerStatus::Error;
                record.error = Some(message);
            }
        }
        record.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn find(&self, event_id: &str) -> Result<Option<EventRecord>, DomainError> {
        Ok(self.records.read().await.get(event_id).cloned())
    }

    async fn reset_for_redrive(&self, event_id: &str) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        let Some(record) = records.get(event_id) else {
            return Ok(false);
        };
        if record.status != LedgerStatus::Error {
            return Ok(false);
        }
        records.remove(event_id);
        Ok(true)
    }
}
