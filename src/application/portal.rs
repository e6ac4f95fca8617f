//! Billing-portal session creation for vendor admins.

use std::sync::Arc;

use crate::domain::foundation::VendorId;
use crate::domain::vendor::BillingError;
use crate::ports::{BillingPortal, VendorRepository};

pub struct PortalService {
    vendors: Arc<dyn VendorRepository>,
    portal: Arc<dyn BillingPortal>,
    return_url: String,
}

impl PortalService {
    pub fn new(
        vendors: Arc<dyn VendorRepository>,
        portal: Arc<dyn BillingPortal>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            vendors,
            portal,
            return_url: return_url.into(),
        }
    }

    /// Creates a self-service portal session for the vendor and returns
    /// the redirect URL. Requires a processor customer on record.
    pub async fn create_session(&self, vendor_id: &VendorId) -> Result<String, BillingError> {
        let vendor = self
            .vendors
            .find_by_id(vendor_id)
            .await?
            .ok_or(crate::domain::foundation::DomainError::not_found("vendor"))?;

        let customer_id = vendor
            .stripe_customer_id
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(BillingError::MissingCustomer)?;

        let url = self
            .portal
            .create_session(customer_id, &self.return_url)
            .await?;
        tracing::info!(vendor_id = %vendor.id, "billing portal session created");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;

    use crate::adapters::memory::InMemoryVendorRepository;
    use crate::domain::foundation::DomainError;
    use crate::domain::vendor::{Vendor, VendorPatch};

    #[derive(Default)]
    struct MockPortal {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl BillingPortal for MockPortal {
        async fn create_session(
            &self,
            customer_id: &str,
            return_url: &str,
        ) -> Result<String, DomainError> {
            self.calls
                .lock()
                .await
                .push((customer_id.to_string(), return_url.to_string()));
            Ok(format!("https://billing.example.com/session/{customer_id}"))
        }
    }

    #[tokio::test]
    async fn creates_session_for_known_customer() {
        let vendors = Arc::new(InMemoryVendorRepository::new());
        let vendor = Vendor::create_from(
            VendorPatch {
                stripe_customer_id: Some("cus_1".to_string()),
                ..Default::default()
            },
            Utc::now(),
        );
        vendors.insert(&vendor).await.unwrap();

        let portal = Arc::new(MockPortal::default());
        let service = PortalService::new(vendors, portal.clone(), "https://lms.example.com/billing");

        let url = service.create_session(&vendor.id).await.unwrap();
        assert_eq!(url, "https://billing.example.com/session/cus_1");
        assert_eq!(
            portal.calls.lock().await.as_slice(),
            &[("cus_1".to_string(), "https://lms.example.com/billing".to_string())]
        );
    }

    #[tokio::test]
    async fn missing_customer_is_rejected() {
        let vendors = Arc::new(InMemoryVendorRepository::new());
        let vendor = Vendor::create_from(VendorPatch::default(), Utc::now());
        vendors.insert(&vendor).await.unwrap();

        let service = PortalService::new(
            vendors,
            Arc::new(MockPortal::default()),
            "https://lms.example.com/billing",
        );
        assert!(matches!(
            service.create_session(&vendor.id).await,
            Err(BillingError::MissingCustomer)
        ));
    }

    #[tokio::test]
    async fn unknown_vendor_is_an_error() {
        let service = PortalService::new(
            Arc::new(InMemoryVendorRepository::new()),
            Arc::new(MockPortal::default()),
            "https://lms.example.com/billing",
        );
        assert!(service
            .create_session(&crate::domain::foundation::VendorId::new())
            .await
            .is_err());
    }
}
