//! In-memory audit log.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, VendorId};
use crate::ports::{AuditEntry, AuditLevel, AuditLog};

#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Test helper: messages recorded at the given level.
    pub async fn messages_at(&self, level: AuditLevel) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(
        &self,
        level: AuditLevel,
        message: &str,
        vendor_id: Option<&VendorId>,
        data: Option<serde_json::Value>,
    ) -> Result<(), DomainError> {
        self.entries.write().await.push(AuditEntry {
            level,
            message: message.to_string(),
            vendor_id: vendor_id.copied(),
            data,
            created_at: Utc::now(),
        });
        Ok(())
    }
}
