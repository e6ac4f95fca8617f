//! Application layer - services orchestrating domain operations over ports.
//!
//! - `directory` - vendor lookup/upsert, provisioning, member management
//! - `reconciler` - status cascade and seat-limit enforcement
//! - `processor` - per-event-type webhook dispatch
//! - `webhook` - verify/parse/ledger pipeline for raw deliveries
//! - `notifications` - templated outbound mail
//! - `portal` - billing-portal session creation

pub mod directory;
pub mod notifications;
pub mod portal;
pub mod processor;
pub mod reconciler;
pub mod webhook;

pub use directory::{MemberUpdate, NewVendorUser, VendorDirectory, VENDOR_ADMIN_ROLE};
pub use notifications::Mailer;
pub use portal::PortalService;
pub use processor::EventProcessor;
pub use reconciler::StatusReconciler;
pub use webhook::{ProcessWebhookHandler, WebhookDisposition};
