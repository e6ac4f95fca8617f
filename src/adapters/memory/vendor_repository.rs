//! In-memory vendor repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, VendorId};
use crate::domain::vendor::Vendor;
use crate::ports::VendorRepository;

#[derive(Default)]
pub struct InMemoryVendorRepository {
    vendors: RwLock<HashMap<VendorId, Vendor>>,
}

impl InMemoryVendorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VendorRepository for InMemoryVendorRepository {
    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, DomainError> {
        Ok(self.vendors.read().await.get(id).cloned())
    }

    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<Vendor>, DomainError> {
        Ok(self
            .vendors
            .read()
            .await
            .values()
            .find(|v| v.stripe_subscription_id.as_deref() == Some(subscription_id))
            .cloned())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<Vendor>, DomainError> {
        Ok(self
            .vendors
            .read()
            .await
            .values()
            .find(|v| v.stripe_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn find_by_admin_email(&self, email: &str) -> Result<Option<Vendor>, DomainError> {
        Ok(self
            .vendors
            .read()
            .await
            .values()
            .find(|v| v.admin_email.as_deref() == Some(email))
            .cloned())
    }

    async fn insert(&self, vendor: &Vendor) -> Result<(), DomainError> {
        let mut vendors = self.vendors.write().await;
        if vendors.contains_key(&vendor.id) {
            return Err(DomainError::Conflict(format!(
                "vendor {} already exists",
                vendor.id
            )));
        }
        vendors.insert(vendor.id, vendor.clone());
        Ok(())
    }

    async fn update(&self, vendor: &Vendor) -> Result<(), DomainError> {
        let mut vendors = self.vendors.write().await;
        if !vendors.contains_key(&vendor.id) {
            return Err(DomainError::not_found("vendor"));
        }
        vendors.insert(vendor.id, vendor.clone());
        Ok(())
    }
}
