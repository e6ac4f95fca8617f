//! PostgreSQL implementation of the audit log.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, VendorId};
use crate::ports::{AuditLevel, AuditLog};

use super::storage_error;

pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn append(
        &self,
        level: AuditLevel,
        message: &str,
        vendor_id: Option<&VendorId>,
        data: Option<serde_json::Value>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO vendor_audit_log (level, message, vendor_id, data, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(level.as_str())
        .bind(message)
        .bind(vendor_id.map(|id| id.as_uuid()))
        .bind(&data)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }
}
