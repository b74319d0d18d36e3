use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The chat participant that originated an event.
///
/// Display fields are refreshed on every event; the id is stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Platform-specific user ID.
    pub id: String,
    /// Human-readable name (first + last, or username fallback).
    pub display_name: String,
    pub username: Option<String>,
    /// IETF language tag reported by the platform, if any.
    pub locale: Option<String>,
}

/// What kind of input the event carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A `/command`, with the bare name and the full raw text.
    Command { name: String, text: String },
    /// An inline-button tap, carrying its callback token.
    Callback { token: String },
    /// A free-text message.
    Text { body: String },
}

/// A single routed unit of input from the transport.
///
/// Created fresh per delivery, never mutated, discarded after dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub id: Uuid,
    /// Platform-specific chat to route responses back to.
    pub chat_id: String,
    pub principal: Principal,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

impl InboundEvent {
    /// The raw message text, if this event kind carries any.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Command { text, .. } => Some(text),
            EventKind::Text { body } => Some(body),
            EventKind::Callback { .. } => None,
        }
    }
}

/// One inline button: a label shown to the user and the token sent back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    pub fn new(label: &str, token: &str) -> Self {
        Self {
            label: label.to_string(),
            token: token.to_string(),
        }
    }
}

/// What a handler wants sent back to the originating chat.
///
/// An empty response means "say nothing" — the dispatcher returns one
/// for every event, so the gateway only has to check `is_empty`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    /// Inline keyboard rows; empty = no keyboard.
    pub keyboard: Vec<Vec<Button>>,
}

impl Response {
    /// A text-only response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    /// A response with an inline keyboard.
    pub fn with_keyboard(text: impl Into<String>, keyboard: Vec<Vec<Button>>) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }

    /// The silent no-op response.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A message addressed to a specific chat, ready for the transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub chat_id: String,
    pub text: String,
    pub keyboard: Vec<Vec<Button>>,
}

impl OutgoingMessage {
    /// Address a handler response to a chat.
    pub fn from_response(chat_id: &str, response: Response) -> Self {
        Self {
            chat_id: chat_id.to_string(),
            text: response.text,
            keyboard: response.keyboard,
        }
    }
}

/// The persisted last-activity snapshot for a Principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub display_name: String,
    pub username: Option<String>,
    pub locale: Option<String>,
    pub last_command: Option<String>,
    pub last_command_at: Option<DateTime<Utc>>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Build the write-through snapshot for an event, merging over the
    /// prior record so that exactly one of {last command, last message}
    /// changes — chosen by the `/` command marker.
    pub fn snapshot(event: &InboundEvent, prior: Option<&UserRecord>) -> Self {
        let mut record = prior.cloned().unwrap_or_default();
        record.display_name = event.principal.display_name.clone();
        record.username = event.principal.username.clone();
        record.locale = event.principal.locale.clone();

        if let Some(text) = event.text() {
            if text.starts_with('/') {
                record.last_command = Some(text.to_string());
                record.last_command_at = Some(event.timestamp);
            } else {
                record.last_message = Some(text.to_string());
                record.last_message_at = Some(event.timestamp);
            }
        }
        record
    }
}

/// Audit record for a command issued by a non-admin Principal.
///
/// Transient: constructed, handed to the sink, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAuditEvent {
    pub command: String,
    pub principal_id: String,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind) -> InboundEvent {
        InboundEvent {
            id: Uuid::new_v4(),
            chat_id: "100".into(),
            principal: Principal {
                id: "42".into(),
                display_name: "Ada".into(),
                username: Some("ada".into()),
                locale: Some("en".into()),
            },
            kind,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_event_text_by_kind() {
        let cmd = event(EventKind::Command {
            name: "start".into(),
            text: "/start".into(),
        });
        assert_eq!(cmd.text(), Some("/start"));

        let msg = event(EventKind::Text {
            body: "an idea".into(),
        });
        assert_eq!(msg.text(), Some("an idea"));

        let tap = event(EventKind::Callback {
            token: "learn_more".into(),
        });
        assert_eq!(tap.text(), None);
    }

    #[test]
    fn test_snapshot_command_updates_only_command_side() {
        let prior = UserRecord {
            last_message: Some("old idea".into()),
            ..Default::default()
        };
        let ev = event(EventKind::Command {
            name: "help".into(),
            text: "/help".into(),
        });
        let snap = UserRecord::snapshot(&ev, Some(&prior));
        assert_eq!(snap.last_command.as_deref(), Some("/help"));
        assert_eq!(snap.last_command_at, Some(ev.timestamp));
        // The message side carries over untouched.
        assert_eq!(snap.last_message.as_deref(), Some("old idea"));
        assert!(snap.last_message_at.is_none());
    }

    #[test]
    fn test_snapshot_text_updates_only_message_side() {
        let ev = event(EventKind::Text {
            body: "AI fridge".into(),
        });
        let snap = UserRecord::snapshot(&ev, None);
        assert_eq!(snap.last_message.as_deref(), Some("AI fridge"));
        assert!(snap.last_command.is_none());
        assert_eq!(snap.display_name, "Ada");
        assert_eq!(snap.username.as_deref(), Some("ada"));
    }

    #[test]
    fn test_snapshot_callback_refreshes_display_fields_only() {
        let prior = UserRecord {
            display_name: "Old Name".into(),
            last_command: Some("/start".into()),
            ..Default::default()
        };
        let ev = event(EventKind::Callback {
            token: "contact".into(),
        });
        let snap = UserRecord::snapshot(&ev, Some(&prior));
        assert_eq!(snap.display_name, "Ada");
        assert_eq!(snap.last_command.as_deref(), Some("/start"));
        assert!(snap.last_message.is_none());
    }

    #[test]
    fn test_empty_response_is_empty() {
        assert!(Response::empty().is_empty());
        assert!(!Response::text("hi").is_empty());
    }
}
