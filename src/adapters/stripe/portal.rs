//! Stripe billing-portal session adapter.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::DomainError;
use crate::ports::BillingPortal;

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

pub struct StripeBillingPortal {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl StripeBillingPortal {
    pub fn new(api_key: SecretString) -> Self {
        Self::with_api_base(api_key, DEFAULT_API_BASE)
    }

    /// Overrides the API host, e.g. for stripe-mock in tests.
    pub fn with_api_base(api_key: SecretString, api_base: impl Into<String>) -> Self {
        Self {
            api_key,
            api_base: api_base.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PortalSessionResponse {
    url: String,
}

#[async_trait]
impl BillingPortal for StripeBillingPortal {
    async fn create_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, DomainError> {
        let response = self
            .client
            .post(format!("{}/v1/billing_portal/sessions", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .form(&[("customer", customer_id), ("return_url", return_url)])
            .send()
            .await
            .map_err(|e| DomainError::provider(format!("portal session request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "stripe portal session creation failed");
            return Err(DomainError::provider(format!(
                "portal session creation failed with status {status}"
            )));
        }

        let session: PortalSessionResponse = response
            .json()
            .await
            .map_err(|e| DomainError::provider(format!("invalid portal session response: {e}")))?;
        Ok(session.url)
    }
}
