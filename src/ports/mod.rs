//! Ports - async traits the application layer depends on.
//!
//! Adapters implement these traits; services receive them as
//! `Arc<dyn Trait>` so infrastructure can be swapped without touching
//! business logic.

mod audit_log;
mod billing_portal;
mod event_ledger;
mod notifier;
mod user_directory;
mod vendor_repository;

pub use audit_log::{AuditEntry, AuditLevel, AuditLog};
pub use billing_portal::BillingPortal;
pub use event_ledger::{EventLedger, EventOutcome, EventRecord, InsertOutcome, LedgerStatus};
pub use notifier::{Notifier, OutboundMessage};
pub use user_directory::{Account, NewAccount, UserDirectory};
pub use vendor_repository::VendorRepository;
