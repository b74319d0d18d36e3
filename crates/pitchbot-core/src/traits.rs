use crate::{
    error::PitchbotError,
    event::{AdminAuditEvent, InboundEvent, OutgoingMessage, UserRecord},
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Chat transport trait — the front door.
///
/// Every chat platform (Telegram today) implements this trait to
/// deliver inbound events and carry outbound messages. Delivery
/// semantics (long-poll vs. webhook) are the transport's concern.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name.
    fn name(&self) -> &str;

    /// Start listening for inbound events.
    /// Returns a receiver that yields events in delivery order per chat.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<InboundEvent>, PitchbotError>;

    /// Send a message to a chat.
    async fn send(&self, message: OutgoingMessage) -> Result<(), PitchbotError>;

    /// Signal a transient "typing" status for a chat.
    async fn send_typing(&self, _chat_id: &str) -> Result<(), PitchbotError> {
        Ok(())
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), PitchbotError>;
}

/// Plan generator trait — the brain behind idea intake.
///
/// Turns a free-text prompt into generated plan text.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Human-readable planner name.
    fn name(&self) -> &str;

    /// Whether this planner requires an API key to function.
    fn requires_api_key(&self) -> bool;

    /// Generate plan text for a prompt.
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, PitchbotError>;

    /// Check if the planner is reachable and ready.
    async fn is_available(&self) -> bool;
}

/// Audit sink trait — fire-and-forget from the core's perspective.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one administrative event.
    async fn record(&self, event: &AdminAuditEvent) -> Result<(), PitchbotError>;
}

/// User state store trait — durable per-Principal key/value records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Write the record for a Principal.
    async fn write(&self, principal_id: &str, record: &UserRecord) -> Result<(), PitchbotError>;

    /// Flush pending writes to durable storage.
    async fn flush(&self) -> Result<(), PitchbotError>;

    /// Read back every stored record, keyed by Principal id.
    async fn read_all(&self) -> Result<HashMap<String, UserRecord>, PitchbotError>;
}
