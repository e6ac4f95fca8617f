//! Port for outbound user notifications.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// A rendered message ready to deliver.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub recipient_email: String,
    pub recipient_name: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<(), DomainError>;
}
