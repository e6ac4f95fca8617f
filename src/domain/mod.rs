//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors)
//! - `vendor` - Vendor records, subscription status, plan resolution
//! - `webhook` - Signature verification and event envelopes

pub mod foundation;
pub mod vendor;
pub mod webhook;
