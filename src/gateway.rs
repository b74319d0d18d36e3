//! Gateway — the event loop connecting the transport to the dispatcher.
//!
//! Events are handled one at a time in delivery order: one inbound
//! event runs through middleware, handler, and collaborator I/O to
//! completion before the next is taken. Graceful shutdown on Ctrl-C.

use crate::dispatch::Dispatcher;
use pitchbot_core::{event::{InboundEvent, OutgoingMessage}, traits::Transport};
use std::sync::Arc;
use tracing::{error, info};

pub struct Gateway {
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>, dispatcher: Dispatcher) -> Self {
        Self {
            transport,
            dispatcher,
        }
    }

    /// Run the main event loop until shutdown.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut rx = self
            .transport
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start transport: {e}"))?;

        info!("PitchBot gateway running | transport: {}", self.transport.name());

        loop {
            tokio::select! {
                maybe_event = rx.recv() => {
                    match maybe_event {
                        Some(event) => self.handle_event(event).await,
                        None => {
                            info!("transport closed its event stream");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        if let Err(e) = self.transport.stop().await {
            error!("failed to stop transport: {e}");
        }
        info!("Shutdown complete.");
        Ok(())
    }

    /// Dispatch a single event and deliver its response, if any.
    async fn handle_event(&self, event: InboundEvent) {
        let preview = event
            .text()
            .map(|t| {
                if t.chars().count() > 60 {
                    let head: String = t.chars().take(60).collect();
                    format!("{head}...")
                } else {
                    t.to_string()
                }
            })
            .unwrap_or_else(|| format!("{:?}", event.kind));
        info!("[{}] {} says: {preview}", event.chat_id, event.principal.display_name);

        let response = self.dispatcher.dispatch(&event).await;
        if response.is_empty() {
            return;
        }

        let message = OutgoingMessage::from_response(&event.chat_id, response);
        if let Err(e) = self.transport.send(message).await {
            error!("failed to send response to chat {}: {e}", event.chat_id);
        }
    }
}
