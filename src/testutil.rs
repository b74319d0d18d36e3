//! Shared mock collaborators and event builders for unit tests.

use async_trait::async_trait;
use chrono::Utc;
use pitchbot_core::{
    error::PitchbotError,
    event::{
        AdminAuditEvent, EventKind, InboundEvent, OutgoingMessage, Principal, UserRecord,
    },
    traits::{AuditSink, Planner, Transport, UserStore},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Transport that records everything sent through it.
#[derive(Default)]
pub struct MockTransport {
    pub sent: Mutex<Vec<OutgoingMessage>>,
    pub typing: Mutex<Vec<String>>,
    pub fail_send: AtomicBool,
}

impl MockTransport {
    pub fn failing() -> Self {
        let t = Self::default();
        t.fail_send.store(true, Ordering::SeqCst);
        t
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(
        &self,
    ) -> Result<tokio::sync::mpsc::Receiver<InboundEvent>, PitchbotError> {
        let (_tx, rx) = tokio::sync::mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), PitchbotError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(PitchbotError::Transport("mock send failure".into()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), PitchbotError> {
        self.typing.lock().unwrap().push(chat_id.to_string());
        Ok(())
    }

    async fn stop(&self) -> Result<(), PitchbotError> {
        Ok(())
    }
}

/// Planner returning a fixed plan, or failing when `plan` is `None`.
#[derive(Default)]
pub struct MockPlanner {
    pub plan: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl MockPlanner {
    pub fn with_plan(plan: &str) -> Self {
        Self {
            plan: Some(plan.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Planner for MockPlanner {
    fn name(&self) -> &str {
        "mock"
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    async fn generate(
        &self,
        prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, PitchbotError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.plan
            .clone()
            .ok_or_else(|| PitchbotError::Generation("mock generation failure".into()))
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Audit sink recording events, optionally failing every call.
#[derive(Default)]
pub struct MockSink {
    pub events: Mutex<Vec<AdminAuditEvent>>,
    pub fail: bool,
}

#[async_trait]
impl AuditSink for MockSink {
    async fn record(&self, event: &AdminAuditEvent) -> Result<(), PitchbotError> {
        if self.fail {
            return Err(PitchbotError::Sink("mock sink failure".into()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// In-memory user store, optionally failing every call.
#[derive(Default)]
pub struct MockStore {
    pub records: Mutex<HashMap<String, UserRecord>>,
    pub fail: bool,
}

#[async_trait]
impl UserStore for MockStore {
    async fn write(
        &self,
        principal_id: &str,
        record: &UserRecord,
    ) -> Result<(), PitchbotError> {
        if self.fail {
            return Err(PitchbotError::Store("mock store failure".into()));
        }
        self.records
            .lock()
            .unwrap()
            .insert(principal_id.to_string(), record.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<(), PitchbotError> {
        if self.fail {
            return Err(PitchbotError::Store("mock store failure".into()));
        }
        Ok(())
    }

    async fn read_all(&self) -> Result<HashMap<String, UserRecord>, PitchbotError> {
        if self.fail {
            return Err(PitchbotError::Store("mock store failure".into()));
        }
        Ok(self.records.lock().unwrap().clone())
    }
}

fn principal(user_id: &str) -> Principal {
    Principal {
        id: user_id.to_string(),
        display_name: "Ada Lovelace".to_string(),
        username: Some("ada".to_string()),
        locale: Some("en".to_string()),
    }
}

fn event(user_id: &str, kind: EventKind) -> InboundEvent {
    InboundEvent {
        id: Uuid::new_v4(),
        chat_id: "100".to_string(),
        principal: principal(user_id),
        kind,
        timestamp: Utc::now(),
    }
}

pub fn text_event(user_id: &str, body: &str) -> InboundEvent {
    event(
        user_id,
        EventKind::Text {
            body: body.to_string(),
        },
    )
}

pub fn command_event(user_id: &str, name: &str) -> InboundEvent {
    event(
        user_id,
        EventKind::Command {
            name: name.to_string(),
            text: format!("/{name}"),
        },
    )
}

pub fn callback_event(user_id: &str, token: &str) -> InboundEvent {
    event(
        user_id,
        EventKind::Callback {
            token: token.to_string(),
        },
    )
}
