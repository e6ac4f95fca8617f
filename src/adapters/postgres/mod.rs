//! PostgreSQL port implementations backed by sqlx.

mod audit_log;
mod event_ledger;
mod vendor_repository;

pub use audit_log::PostgresAuditLog;
pub use event_ledger::PostgresEventLedger;
pub use vendor_repository::PostgresVendorRepository;

use crate::domain::foundation::DomainError;

fn storage_error(err: sqlx::Error) -> DomainError {
    DomainError::storage(err.to_string())
}
