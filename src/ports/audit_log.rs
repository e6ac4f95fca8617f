//! Port for the append-only billing audit log.
//!
//! The audit log is the durable, vendor-scoped record of billing activity;
//! `tracing` covers operational logging only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::{DomainError, VendorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Info,
    Warning,
    Error,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::Info => "info",
            AuditLevel::Warning => "warning",
            AuditLevel::Error => "error",
        }
    }
}

/// One audit record.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub level: AuditLevel,
    pub message: String,
    pub vendor_id: Option<VendorId>,
    /// Structured context stored alongside the message.
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(
        &self,
        level: AuditLevel,
        message: &str,
        vendor_id: Option<&VendorId>,
        data: Option<serde_json::Value>,
    ) -> Result<(), DomainError>;
}
