//! Notification configuration

use serde::Deserialize;

use super::error::ValidationError;

/// One notification template. Empty subject or body disables the
/// notification; the send is skipped with an audit warning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageTemplate {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Notification templates and site identity used for placeholder
/// substitution (`{sitename}`, `{loginurl}`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Login URL included in credential mails
    #[serde(default)]
    pub login_url: String,

    /// Welcome mail for a newly created vendor administrator
    #[serde(default)]
    pub admin_welcome: MessageTemplate,

    /// Welcome mail for a provisioned vendor member
    #[serde(default)]
    pub user_welcome: MessageTemplate,

    /// Notice to the admin when the vendor is suspended
    #[serde(default)]
    pub suspension: MessageTemplate,
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.site_name.is_empty() {
            return Err(ValidationError::MissingRequired("NOTIFICATIONS__SITE_NAME"));
        }
        Ok(())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            site_name: default_site_name(),
            login_url: String::new(),
            admin_welcome: MessageTemplate::default(),
            user_welcome: MessageTemplate::default(),
            suspension: MessageTemplate::default(),
        }
    }
}

fn default_site_name() -> String {
    "Learning Platform".to_string()
}
