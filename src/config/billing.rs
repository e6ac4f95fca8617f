//! Billing configuration (payment processor)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::vendor::PriceMap;
use crate::domain::webhook::DEFAULT_TOLERANCE_SECS;

use super::error::ValidationError;

/// Billing configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Stripe secret API key
    pub stripe_api_key: SecretString,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// Allowed signature age in seconds; 0 disables the freshness check
    #[serde(default = "default_tolerance")]
    pub signature_tolerance_secs: i64,

    /// JSON table mapping price IDs to plan attributes, e.g.
    /// `{"price_123": {"plan_code": "team", "seat_limit": 25}}`
    #[serde(default)]
    pub price_map: String,

    /// URL vendors return to after the billing portal
    #[serde(default)]
    pub portal_return_url: String,
}

impl BillingConfig {
    /// Parse the configured price map.
    pub fn price_map(&self) -> Result<PriceMap, ValidationError> {
        PriceMap::from_json(&self.price_map)
            .map_err(|e| ValidationError::InvalidPriceMap(e.to_string()))
    }

    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_test_")
    }

    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let api_key = self.stripe_api_key.expose_secret();
        if api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if !api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }

        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        if self.signature_tolerance_secs < 0 {
            return Err(ValidationError::InvalidToleranceWindow);
        }

        self.price_map()?;
        Ok(())
    }
}

fn default_tolerance() -> i64 {
    DEFAULT_TOLERANCE_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> BillingConfig {
        BillingConfig {
            stripe_api_key: SecretString::new("sk_test_xxx".to_string()),
            stripe_webhook_secret: "whsec_xxx".to_string(),
            signature_tolerance_secs: default_tolerance(),
            price_map: String::new(),
            portal_return_url: String::new(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
        assert!(valid_config().is_test_mode());
    }

    #[test]
    fn bad_key_prefixes_are_rejected() {
        let mut config = valid_config();
        config.stripe_api_key = SecretString::new("pk_test_xxx".to_string());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidStripeKey)
        ));

        let mut config = valid_config();
        config.stripe_webhook_secret = "secret".to_string();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidStripeWebhookSecret)
        ));
    }

    #[test]
    fn malformed_price_map_is_rejected() {
        let mut config = valid_config();
        config.price_map = "{not json".to_string();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPriceMap(_))
        ));
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let mut config = valid_config();
        config.signature_tolerance_secs = -1;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidToleranceWindow)
        ));
    }
}
