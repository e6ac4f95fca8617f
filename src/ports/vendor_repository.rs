//! Port for vendor record persistence.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, VendorId};
use crate::domain::vendor::Vendor;

/// Storage for vendor records.
///
/// Lookup-priority logic (subscription ID before customer ID, then admin
/// email) lives in the application layer; the repository only answers
/// single-key queries.
#[async_trait]
pub trait VendorRepository: Send + Sync {
    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, DomainError>;

    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Vendor>, DomainError>;

    async fn find_by_customer_id(&self, customer_id: &str)
        -> Result<Option<Vendor>, DomainError>;

    /// Lookup by normalized admin email.
    async fn find_by_admin_email(&self, email: &str) -> Result<Option<Vendor>, DomainError>;

    async fn insert(&self, vendor: &Vendor) -> Result<(), DomainError>;

    /// Persists the full record; last write wins.
    async fn update(&self, vendor: &Vendor) -> Result<(), DomainError>;
}
