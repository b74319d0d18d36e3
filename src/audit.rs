//! Audit sink delivering admin events as chat messages.

use async_trait::async_trait;
use pitchbot_core::{
    error::PitchbotError,
    event::{AdminAuditEvent, OutgoingMessage},
    traits::{AuditSink, Transport},
};
use std::sync::Arc;
use tracing::debug;

/// Sends each audit event to the administrator's chat through the
/// transport, mirroring how the admin sees everything else.
pub struct ChatAuditSink {
    transport: Arc<dyn Transport>,
    admin_chat_id: String,
}

impl ChatAuditSink {
    pub fn new(transport: Arc<dyn Transport>, admin_chat_id: String) -> Self {
        Self {
            transport,
            admin_chat_id,
        }
    }
}

#[async_trait]
impl AuditSink for ChatAuditSink {
    async fn record(&self, event: &AdminAuditEvent) -> Result<(), PitchbotError> {
        if self.admin_chat_id.is_empty() {
            debug!("no admin chat configured, dropping audit event");
            return Ok(());
        }

        let message = OutgoingMessage {
            chat_id: self.admin_chat_id.clone(),
            text: format!(
                "Command: {}\nUser ID: {}\nUser Name: {}",
                event.command, event.principal_id, event.display_name
            ),
            keyboard: Vec::new(),
        };

        self.transport
            .send(message)
            .await
            .map_err(|e| PitchbotError::Sink(format!("audit delivery failed: {e}")))
    }
}
