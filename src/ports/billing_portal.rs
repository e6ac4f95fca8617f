//! Port for the payment processor's self-service billing portal.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

#[async_trait]
pub trait BillingPortal: Send + Sync {
    /// Creates a portal session for the given processor customer and
    /// returns the URL to redirect the vendor admin to.
    async fn create_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, DomainError>;
}
