//! Vendor billing core: webhook ingestion and subscription-state reconciliation.
//!
//! # Module Organization
//!
//! - `domain` - Business types and pure logic (vendor records, plan resolution,
//!   webhook signature verification, event envelopes)
//! - `ports` - Async traits the application depends on (repositories, ledger,
//!   host-platform user directory, notifier, audit log, billing portal)
//! - `application` - Services orchestrating domain operations across ports
//! - `adapters` - Port implementations (HTTP, in-memory, PostgreSQL, Stripe)
//! - `config` - Typed configuration loaded from environment variables

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
