//! Middleware chain — ordered cross-cutting behaviors around every
//! routed handler.
//!
//! Each unit gets {pre, post, fault} hooks with default no-op impls.
//! Units are composed in a fixed declared order and each one fails
//! open inside its own boundary: a failing hook is logged and the
//! terminal handler still runs. Side effects are attempted, never
//! required to succeed.

use pitchbot_core::{
    error::PitchbotError,
    event::{AdminAuditEvent, InboundEvent, Response, UserRecord},
    traits::{AuditSink, Transport, UserStore},
};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// One composable cross-cutting behavior.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in fail-open log lines.
    fn name(&self) -> &str;

    /// Runs before the wrapped handler.
    async fn before(&self, _event: &InboundEvent) -> Result<(), PitchbotError> {
        Ok(())
    }

    /// Runs after the wrapped handler, with its response.
    async fn after(
        &self,
        _event: &InboundEvent,
        _response: &Response,
    ) -> Result<(), PitchbotError> {
        Ok(())
    }

    /// Called when one of this unit's own hooks fails.
    async fn on_fault(&self, _event: &InboundEvent, _error: &PitchbotError) {}
}

/// A fixed ordered list of middleware units wrapping a terminal handler.
///
/// Pre-hooks run outermost→innermost, then the handler, then post-hooks
/// in reverse. Hook failures never propagate past the failing unit.
pub struct MiddlewareChain {
    units: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new(units: Vec<Arc<dyn Middleware>>) -> Self {
        Self { units }
    }

    /// Execute the chain around a terminal handler.
    pub async fn run<F, Fut>(&self, event: &InboundEvent, handler: F) -> Response
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Response>,
    {
        for unit in &self.units {
            if let Err(e) = unit.before(event).await {
                warn!("middleware '{}' pre-hook failed (continuing): {e}", unit.name());
                unit.on_fault(event, &e).await;
            }
        }

        let response = handler().await;

        for unit in self.units.iter().rev() {
            if let Err(e) = unit.after(event, &response).await {
                warn!("middleware '{}' post-hook failed: {e}", unit.name());
                unit.on_fault(event, &e).await;
            }
        }

        response
    }
}

/// Best-effort "typing…" status for the event's chat.
pub struct TypingIndicator {
    transport: Arc<dyn Transport>,
}

impl TypingIndicator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Middleware for TypingIndicator {
    fn name(&self) -> &str {
        "typing-indicator"
    }

    async fn before(&self, event: &InboundEvent) -> Result<(), PitchbotError> {
        debug!("sending typing status to chat {}", event.chat_id);
        self.transport.send_typing(&event.chat_id).await
    }
}

/// Reports commands from non-admin Principals to the audit sink.
///
/// No-op when the event carries no text or when the admin is the
/// originator.
pub struct AdminAudit {
    sink: Arc<dyn AuditSink>,
    admin_id: String,
}

impl AdminAudit {
    pub fn new(sink: Arc<dyn AuditSink>, admin_id: String) -> Self {
        Self { sink, admin_id }
    }
}

#[async_trait]
impl Middleware for AdminAudit {
    fn name(&self) -> &str {
        "admin-audit"
    }

    async fn before(&self, event: &InboundEvent) -> Result<(), PitchbotError> {
        let Some(text) = event.text().filter(|t| !t.is_empty()) else {
            return Ok(());
        };
        if event.principal.id == self.admin_id {
            return Ok(());
        }

        self.sink
            .record(&AdminAuditEvent {
                command: text.to_string(),
                principal_id: event.principal.id.clone(),
                display_name: event.principal.display_name.clone(),
            })
            .await
    }
}

/// Writes the Principal's activity record through to the user state
/// store, flushes, then reads it back to detect store corruption.
pub struct UserWriteThrough {
    store: Arc<dyn UserStore>,
}

impl UserWriteThrough {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Middleware for UserWriteThrough {
    fn name(&self) -> &str {
        "user-write-through"
    }

    async fn before(&self, event: &InboundEvent) -> Result<(), PitchbotError> {
        let principal_id = &event.principal.id;
        let prior = self.store.read_all().await?;
        let snapshot = UserRecord::snapshot(event, prior.get(principal_id));

        self.store.write(principal_id, &snapshot).await?;
        self.store.flush().await?;

        let verify = self.store.read_all().await?;
        match verify.get(principal_id) {
            Some(stored) if *stored == snapshot => Ok(()),
            _ => Err(PitchbotError::Store(format!(
                "write-through verification failed for principal {principal_id}"
            ))),
        }
    }
}
