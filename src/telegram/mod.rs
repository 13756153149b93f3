//! # Telegram Module - Bot API transport
//!
//! This module owns everything that talks the Bot API wire format:
//!
//! - [`types`] - serde structs for inbound webhook updates
//! - [`TelegramApi`] - the async seam the relay core sends through
//! - [`BotClient`] - reqwest-backed production implementation
//! - keyboard builders for the admin reply keyboards and the verification
//!   inline keyboard
//!
//! The relay core is generic over [`TelegramApi`], so tests drive it with a
//! recording mock and never open a socket. Every method is fallible; callers
//! handle failures at the call site (log, notify admins). Nothing here
//! retries or panics.

pub mod types;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Errors surfaced by Bot API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection, TLS, malformed response body).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered but rejected the call (`ok: false`).
    #[error("telegram api error: {0}")]
    Telegram(String),
}

/// Target of an outbound call: a numeric chat id or an `@username` handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRef {
    Id(i64),
    Name(String),
}

impl ChatRef {
    fn as_json(&self) -> Value {
        match self {
            ChatRef::Id(id) => json!(id),
            ChatRef::Name(name) => json!(name),
        }
    }
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRef::Id(id) => write!(f, "{}", id),
            ChatRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Optional knobs for `sendMessage`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    /// Forum thread to post into, when targeting a topic group.
    pub message_thread_id: Option<i64>,
    /// Reply/inline keyboard payload, already in wire shape.
    pub reply_markup: Option<Value>,
}

impl SendOptions {
    pub fn in_thread(thread_id: i64) -> Self {
        SendOptions {
            message_thread_id: Some(thread_id),
            ..SendOptions::default()
        }
    }

    pub fn with_markup(markup: Value) -> Self {
        SendOptions {
            reply_markup: Some(markup),
            ..SendOptions::default()
        }
    }
}

/// The messaging primitives the relay core consumes.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Send a text message, optionally into a thread and with a keyboard.
    async fn send_message(
        &self,
        chat: &ChatRef,
        text: &str,
        opts: SendOptions,
    ) -> Result<(), ApiError>;

    /// Duplicate an existing message into a destination thread.
    async fn copy_message(
        &self,
        to: &ChatRef,
        from_chat_id: i64,
        message_id: i64,
        thread_id: i64,
    ) -> Result<(), ApiError>;

    /// Acknowledge an inline keyboard press with a short toast.
    async fn answer_callback_query(&self, callback_id: &str, text: &str) -> Result<(), ApiError>;

    /// Register the webhook address with the platform.
    async fn set_webhook(&self, url: &str) -> Result<(), ApiError>;
}

/// Production Bot API client over HTTPS.
pub struct BotClient {
    client: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl BotClient {
    pub fn new(token: &str) -> Self {
        BotClient {
            client: reqwest::Client::new(),
            base: format!("https://api.telegram.org/bot{}", token),
        }
    }

    async fn call(&self, method: &str, payload: Value) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base, method))
            .json(&payload)
            .send()
            .await?;
        let body: ApiResponse = response.json().await?;
        if body.ok {
            Ok(())
        } else {
            Err(ApiError::Telegram(
                body.description
                    .unwrap_or_else(|| format!("{} rejected", method)),
            ))
        }
    }
}

#[async_trait]
impl TelegramApi for BotClient {
    async fn send_message(
        &self,
        chat: &ChatRef,
        text: &str,
        opts: SendOptions,
    ) -> Result<(), ApiError> {
        let mut payload = json!({
            "chat_id": chat.as_json(),
            "text": text,
        });
        if let Some(thread_id) = opts.message_thread_id {
            payload["message_thread_id"] = json!(thread_id);
        }
        if let Some(markup) = opts.reply_markup {
            payload["reply_markup"] = markup;
        }
        self.call("sendMessage", payload).await
    }

    async fn copy_message(
        &self,
        to: &ChatRef,
        from_chat_id: i64,
        message_id: i64,
        thread_id: i64,
    ) -> Result<(), ApiError> {
        let payload = json!({
            "chat_id": to.as_json(),
            "from_chat_id": from_chat_id,
            "message_id": message_id,
            "message_thread_id": thread_id,
        });
        self.call("copyMessage", payload).await
    }

    async fn answer_callback_query(&self, callback_id: &str, text: &str) -> Result<(), ApiError> {
        let payload = json!({
            "callback_query_id": callback_id,
            "text": text,
        });
        self.call("answerCallbackQuery", payload).await
    }

    async fn set_webhook(&self, url: &str) -> Result<(), ApiError> {
        self.call("setWebhook", json!({ "url": url })).await
    }
}

/// Persistent reply keyboard shown to admins at the main menu.
pub fn admin_keyboard() -> Value {
    json!({
        "keyboard": [
            ["Stats", "Manage Keywords"],
            ["Broadcast Test", "Help"]
        ],
        "resize_keyboard": true,
        "one_time_keyboard": false,
        "is_persistent": true
    })
}

/// Reply keyboard for the keyword-edit submenu.
pub fn keyword_menu() -> Value {
    json!({
        "keyboard": [
            ["Add Keyword", "Remove Keyword"],
            ["Back to Menu"]
        ],
        "resize_keyboard": true,
        "one_time_keyboard": false,
        "is_persistent": true
    })
}

/// Single-row inline keyboard from (label, callback token) pairs.
pub fn inline_options(options: &[(&str, &str)]) -> Value {
    let row: Vec<Value> = options
        .iter()
        .map(|(label, token)| json!({ "text": label, "callback_data": token }))
        .collect();
    json!({ "inline_keyboard": [row] })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_ref_serializes_ids_and_names() {
        assert_eq!(ChatRef::Id(5).as_json(), json!(5));
        assert_eq!(ChatRef::Name("@hub".into()).as_json(), json!("@hub"));
    }

    #[test]
    fn inline_options_carry_tokens() {
        let markup = inline_options(&[("Apple", "yes"), ("Brick", "no")]);
        let row = &markup["inline_keyboard"][0];
        assert_eq!(row[0]["callback_data"], "yes");
        assert_eq!(row[1]["text"], "Brick");
    }

    #[test]
    fn admin_keyboard_is_persistent() {
        let kb = admin_keyboard();
        assert_eq!(kb["is_persistent"], json!(true));
    }
}
