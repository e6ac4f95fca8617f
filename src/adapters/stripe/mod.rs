//! Stripe API adapters.

mod portal;

pub use portal::StripeBillingPortal;
