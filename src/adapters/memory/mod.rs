//! In-memory port implementations.
//!
//! Backing store for tests and for running the service without external
//! infrastructure. Each adapter is a Mutex/RwLock-guarded map with the
//! same observable semantics as its PostgreSQL counterpart.

mod audit_log;
mod event_ledger;
mod notifier;
mod user_directory;
mod vendor_repository;

pub use audit_log::InMemoryAuditLog;
pub use event_ledger::InMemoryEventLedger;
pub use notifier::RecordingNotifier;
pub use user_directory::InMemoryUserDirectory;
pub use vendor_repository::InMemoryVendorRepository;
