//! Shared domain primitives.

mod errors;
mod ids;

pub use errors::DomainError;
pub use ids::{GroupId, UserId, VendorId};
