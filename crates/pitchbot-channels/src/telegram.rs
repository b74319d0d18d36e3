//! Telegram Bot API transport.
//!
//! Uses long polling via `getUpdates`; responses go out through
//! `sendMessage` with optional inline keyboards.
//! Docs: <https://core.telegram.org/bots/api>

use async_trait::async_trait;
use pitchbot_core::{
    config::TelegramConfig,
    error::PitchbotError,
    event::{Button, EventKind, InboundEvent, OutgoingMessage, Principal},
    traits::Transport,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Telegram's hard limit on message length.
const MAX_MESSAGE_LEN: usize = 4096;

/// Telegram transport using the Bot API with long polling.
pub struct TelegramTransport {
    client: reqwest::Client,
    base_url: String,
    /// Tracks the last update_id to avoid reprocessing.
    last_update_id: Arc<Mutex<Option<i64>>>,
}

// --- Telegram API types ---

#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgUpdate {
    update_id: i64,
    message: Option<TgMessage>,
    callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct TgMessage {
    message_id: i64,
    from: Option<TgUser>,
    chat: TgChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgCallbackQuery {
    id: String,
    from: TgUser,
    message: Option<TgMessage>,
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct TgUser {
    id: i64,
    first_name: String,
    last_name: Option<String>,
    username: Option<String>,
    language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

impl TelegramTransport {
    /// Create a new Telegram transport from config.
    pub fn new(config: TelegramConfig) -> Self {
        let base_url = format!("https://api.telegram.org/bot{}", config.bot_token);
        Self {
            client: reqwest::Client::new(),
            base_url,
            last_update_id: Arc::new(Mutex::new(None)),
        }
    }

    /// Send a text message, splitting at Telegram's length limit.
    /// Only the final chunk carries the inline keyboard.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: &[Vec<Button>],
    ) -> Result<(), PitchbotError> {
        let chunks = split_message(text, MAX_MESSAGE_LEN);
        let last = chunks.len() - 1;

        for (i, chunk) in chunks.iter().enumerate() {
            let url = format!("{}/sendMessage", self.base_url);
            let mut body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            if i == last && !keyboard.is_empty() {
                body["reply_markup"] = keyboard_markup(keyboard);
            }

            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| PitchbotError::Transport(format!("telegram send failed: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                return Err(PitchbotError::Transport(format!(
                    "telegram send got {status}: {error_text}"
                )));
            }
        }

        Ok(())
    }

    /// Send a chat action (e.g. "typing") to a chat.
    async fn send_chat_action(&self, chat_id: &str, action: &str) -> Result<(), PitchbotError> {
        let url = format!("{}/sendChatAction", self.base_url);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "action": action,
        });

        self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                PitchbotError::Transport(format!("telegram sendChatAction failed: {e}"))
            })?;

        Ok(())
    }

    /// Register bot commands with Telegram so users see an autocomplete menu.
    /// Best-effort: logs failures but does not propagate errors.
    async fn register_commands(&self) {
        let commands = serde_json::json!({
            "commands": [
                { "command": "start", "description": "Show the main menu" },
                { "command": "help", "description": "Show available commands" },
            ]
        });

        let url = format!("{}/setMyCommands", self.base_url);
        match self.client.post(&url).json(&commands).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("registered Telegram bot commands");
            }
            Ok(resp) => {
                let body = resp.text().await.unwrap_or_default();
                warn!("failed to register Telegram bot commands: {body}");
            }
            Err(e) => {
                warn!("failed to register Telegram bot commands: {e}");
            }
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<InboundEvent>, PitchbotError> {
        self.register_commands().await;

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let last_update_id = self.last_update_id.clone();

        info!("Telegram transport starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let last = last_update_id.lock().await;
                let offset = last.map(|id| id + 1);
                drop(last);

                let mut url = format!("{base_url}/getUpdates?timeout=30");
                if let Some(off) = offset {
                    url.push_str(&format!("&offset={off}"));
                }

                let resp = match client
                    .get(&url)
                    .timeout(std::time::Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!("telegram poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                let body: TgResponse<Vec<TgUpdate>> = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!("telegram parse error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                if !body.ok {
                    error!(
                        "telegram API error (retry in {backoff_secs}s): {}",
                        body.description.unwrap_or_default()
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(60);
                    continue;
                }

                // Successful poll — reset backoff.
                backoff_secs = 1;

                let updates = body.result.unwrap_or_default();

                if let Some(last_update) = updates.last() {
                    *last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let event = if let Some(ref cq) = update.callback_query {
                        // Acknowledge the tap so the client stops its spinner.
                        answer_callback_query(&client, &base_url, &cq.id).await;
                        callback_event(cq)
                    } else if let Some(ref msg) = update.message {
                        message_event(msg)
                    } else {
                        None
                    };

                    let Some(event) = event else { continue };

                    if tx.send(event).await.is_err() {
                        info!("telegram transport receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), PitchbotError> {
        if message.chat_id.is_empty() {
            return Err(PitchbotError::Transport(
                "no chat_id on outgoing message".into(),
            ));
        }
        self.send_message(&message.chat_id, &message.text, &message.keyboard)
            .await
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), PitchbotError> {
        self.send_chat_action(chat_id, "typing").await
    }

    async fn stop(&self) -> Result<(), PitchbotError> {
        info!("Telegram transport stopped");
        Ok(())
    }
}

/// Acknowledge a callback query. Best-effort.
async fn answer_callback_query(client: &reqwest::Client, base_url: &str, query_id: &str) {
    let url = format!("{base_url}/answerCallbackQuery");
    let body = serde_json::json!({ "callback_query_id": query_id });
    if let Err(e) = client.post(&url).json(&body).send().await {
        debug!("answerCallbackQuery failed: {e}");
    }
}

/// Map a Telegram message into an inbound command or text event.
fn message_event(msg: &TgMessage) -> Option<InboundEvent> {
    let text = msg.text.clone()?;
    let user = msg.from.as_ref()?;

    let kind = if let Some(stripped) = text.strip_prefix('/') {
        // "/start@SomeBot arg" → name "start".
        let name = stripped
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();
        EventKind::Command { name, text }
    } else {
        EventKind::Text { body: text }
    };

    Some(InboundEvent {
        id: Uuid::new_v4(),
        chat_id: msg.chat.id.to_string(),
        principal: principal_from(user),
        kind,
        timestamp: chrono::Utc::now(),
    })
}

/// Map a Telegram callback query into an inbound callback event.
fn callback_event(cq: &TgCallbackQuery) -> Option<InboundEvent> {
    let token = cq.data.clone()?;
    // The chat to answer in comes from the message the button hung off.
    let chat_id = cq.message.as_ref()?.chat.id.to_string();

    Some(InboundEvent {
        id: Uuid::new_v4(),
        chat_id,
        principal: principal_from(&cq.from),
        kind: EventKind::Callback { token },
        timestamp: chrono::Utc::now(),
    })
}

fn principal_from(user: &TgUser) -> Principal {
    let display_name = if let Some(ref ln) = user.last_name {
        format!("{} {ln}", user.first_name)
    } else if !user.first_name.is_empty() {
        user.first_name.clone()
    } else if let Some(ref un) = user.username {
        format!("@{un}")
    } else {
        user.id.to_string()
    };

    Principal {
        id: user.id.to_string(),
        display_name,
        username: user.username.clone(),
        locale: user.language_code.clone(),
    }
}

/// Build the `reply_markup` JSON for an inline keyboard.
fn keyboard_markup(keyboard: &[Vec<Button>]) -> serde_json::Value {
    let rows: Vec<Vec<serde_json::Value>> = keyboard
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| {
                    serde_json::json!({
                        "text": b.label,
                        "callback_data": b.token,
                    })
                })
                .collect()
        })
        .collect();
    serde_json::json!({ "inline_keyboard": rows })
}

/// Split a long message into chunks that respect Telegram's limit.
fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Byte offset must not land inside a multi-byte character.
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let break_at = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .map(|i| start + i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }

    chunks
}
