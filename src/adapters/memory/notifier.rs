//! Recording notifier.
//!
//! Captures outbound messages instead of delivering them. Used by tests
//! and by the default wiring when no mail integration is configured; each
//! captured message is also traced so a dev run shows what would be sent.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::{Notifier, OutboundMessage};

#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<OutboundMessage>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: OutboundMessage) -> Result<(), DomainError> {
        tracing::info!(
            recipient = %message.recipient_email,
            subject = %message.subject,
            "notification captured"
        );
        self.sent.write().await.push(message);
        Ok(())
    }
}
