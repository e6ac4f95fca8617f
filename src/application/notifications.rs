//! Templated outbound notifications.
//!
//! Templates come from configuration and support the placeholders
//! `{sitename}`, `{loginurl}`, `{vendorname}`, `{email}` and, for
//! credential mails, `{username}` / `{password}`. An empty template means
//! the deployment opted out of that notification; the send is skipped and
//! a warning lands in the audit log.

use std::sync::Arc;

use crate::config::{MessageTemplate, NotificationConfig};
use crate::domain::foundation::DomainError;
use crate::domain::vendor::Vendor;
use crate::ports::{Account, AuditLevel, AuditLog, Notifier, OutboundMessage};

/// Sends the billing lifecycle notifications.
pub struct Mailer {
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditLog>,
    config: NotificationConfig,
}

impl Mailer {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditLog>,
        config: NotificationConfig,
    ) -> Self {
        Self {
            notifier,
            audit,
            config,
        }
    }

    /// Welcome mail with first-login credentials for a new vendor admin.
    pub async fn send_admin_welcome(
        &self,
        vendor: &Vendor,
        account: &Account,
        password: &str,
    ) -> Result<(), DomainError> {
        let template = self.config.admin_welcome.clone();
        self.send_templated("admin welcome", template, vendor, account, Some(password))
            .await
    }

    /// Welcome mail with first-login credentials for a provisioned member.
    pub async fn send_user_welcome(
        &self,
        vendor: &Vendor,
        account: &Account,
        password: &str,
    ) -> Result<(), DomainError> {
        let template = self.config.user_welcome.clone();
        self.send_templated("user welcome", template, vendor, account, Some(password))
            .await
    }

    /// Notifies the vendor admin that the vendor's access was suspended.
    pub async fn send_suspension_notice(
        &self,
        vendor: &Vendor,
        account: &Account,
    ) -> Result<(), DomainError> {
        let template = self.config.suspension.clone();
        self.send_templated("suspension notice", template, vendor, account, None)
            .await
    }

    async fn send_templated(
        &self,
        kind: &str,
        template: MessageTemplate,
        vendor: &Vendor,
        account: &Account,
        password: Option<&str>,
    ) -> Result<(), DomainError> {
        if template.subject.is_empty() || template.body.is_empty() {
            tracing::warn!(kind, vendor_id = %vendor.id, "notification template empty, skipping send");
            self.audit
                .append(
                    AuditLevel::Warning,
                    &format!("Notification skipped, no template configured: {kind}"),
                    Some(&vendor.id),
                    None,
                )
                .await?;
            return Ok(());
        }

        let render = |text: &str| {
            let mut out = text
                .replace("{sitename}", &self.config.site_name)
                .replace("{loginurl}", &self.config.login_url)
                .replace("{vendorname}", &vendor.org_name)
                .replace("{email}", &account.email)
                .replace("{username}", &account.username);
            if let Some(password) = password {
                out = out.replace("{password}", password);
            }
            out
        };

        self.notifier
            .send(OutboundMessage {
                recipient_email: account.email.clone(),
                recipient_name: format!("{} {}", account.first_name, account.last_name),
                subject: render(&template.subject),
                body: render(&template.body),
            })
            .await
    }
}
