//! Test utilities & fixtures: a recording mock of the Bot API plus builders
//! for inbound updates and a minimal valid config.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use threadrelay::config::{BotConfig, Config, LoggingConfig, StorageConfig};
use threadrelay::telegram::types::{CallbackQuery, Chat, ChatKind, Message, Update, User};
use threadrelay::telegram::{ApiError, ChatRef, SendOptions, TelegramApi};

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum Outbound {
    Sent {
        chat: ChatRef,
        text: String,
        thread_id: Option<i64>,
        markup: Option<serde_json::Value>,
    },
    Copied {
        to: ChatRef,
        from_chat_id: i64,
        message_id: i64,
        thread_id: i64,
    },
    Answered {
        callback_id: String,
        text: String,
    },
    WebhookSet {
        url: String,
    },
}

/// Records every call; can be told to fail copies or sends.
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<Outbound>>,
    fail_copy: AtomicBool,
    fail_send_to_group: AtomicBool,
}

#[allow(dead_code)]
impl MockApi {
    pub fn new() -> Self {
        MockApi::default()
    }

    pub fn failing_copies() -> Self {
        let api = MockApi::default();
        api.fail_copy.store(true, Ordering::SeqCst);
        api
    }

    pub fn failing_group_sends() -> Self {
        let api = MockApi::default();
        api.fail_send_to_group.store(true, Ordering::SeqCst);
        api
    }

    pub fn outbound(&self) -> Vec<Outbound> {
        self.calls.lock().unwrap().clone()
    }

    /// Texts of all sent messages, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.outbound()
            .into_iter()
            .filter_map(|call| match call {
                Outbound::Sent { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Sent messages addressed to a specific chat id.
    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.outbound()
            .into_iter()
            .filter_map(|call| match call {
                Outbound::Sent { chat, text, .. } if chat == ChatRef::Id(chat_id) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn copies(&self) -> Vec<Outbound> {
        self.outbound()
            .into_iter()
            .filter(|call| matches!(call, Outbound::Copied { .. }))
            .collect()
    }

    pub fn last_sent(&self) -> Option<String> {
        self.sent_texts().pop()
    }
}

#[async_trait]
impl TelegramApi for MockApi {
    async fn send_message(
        &self,
        chat: &ChatRef,
        text: &str,
        opts: SendOptions,
    ) -> Result<(), ApiError> {
        let to_group = matches!(chat, ChatRef::Name(_));
        self.calls.lock().unwrap().push(Outbound::Sent {
            chat: chat.clone(),
            text: text.to_string(),
            thread_id: opts.message_thread_id,
            markup: opts.reply_markup,
        });
        if to_group && self.fail_send_to_group.load(Ordering::SeqCst) {
            return Err(ApiError::Telegram("chat not found".into()));
        }
        Ok(())
    }

    async fn copy_message(
        &self,
        to: &ChatRef,
        from_chat_id: i64,
        message_id: i64,
        thread_id: i64,
    ) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(Outbound::Copied {
            to: to.clone(),
            from_chat_id,
            message_id,
            thread_id,
        });
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(ApiError::Telegram("message thread not found".into()));
        }
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, text: &str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(Outbound::Answered {
            callback_id: callback_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn set_webhook(&self, url: &str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(Outbound::WebhookSet {
            url: url.to_string(),
        });
        Ok(())
    }
}

pub const ADMIN: i64 = 1;
pub const SECOND_ADMIN: i64 = 2;

/// Minimal valid config whose topic table lives under `dir`.
#[allow(dead_code)]
pub fn base_config(dir: &Path) -> Config {
    Config {
        bot: BotConfig {
            token: "123:test".into(),
            base_url: "https://relay.test".into(),
            source_channel: "@channel".into(),
            destination_group: "@hub".into(),
            admin_ids: vec![ADMIN, SECOND_ADMIN],
        },
        storage: StorageConfig {
            topics_file: dir.join("topics.json").to_str().unwrap().to_string(),
        },
        logging: LoggingConfig {
            level: "error".into(),
            file: None,
        },
    }
}

/// Write a topic table file for the server to load at startup.
#[allow(dead_code)]
pub fn seed_topics(config: &Config, json: &str) {
    std::fs::write(&config.storage.topics_file, json).unwrap();
}

#[allow(dead_code)]
pub const DEFAULT_TOPICS: &str = r#"{
  "gift": {
    "thread_id": 42,
    "keywords": ["promo", "sale"]
  },
  "news": {
    "thread_id": 7,
    "keywords": ["update"]
  }
}"#;

#[allow(dead_code)]
pub fn private_message(user_id: i64, text: &str) -> Update {
    Update {
        update_id: 1,
        message: Some(Message {
            message_id: 100,
            from: Some(User { id: user_id }),
            chat: Chat {
                id: user_id,
                kind: ChatKind::Private,
            },
            text: Some(text.to_string()),
            caption: None,
        }),
        channel_post: None,
        callback_query: None,
    }
}

#[allow(dead_code)]
pub fn group_message(user_id: i64, chat_id: i64, text: &str) -> Update {
    Update {
        update_id: 2,
        message: Some(Message {
            message_id: 101,
            from: Some(User { id: user_id }),
            chat: Chat {
                id: chat_id,
                kind: ChatKind::Supergroup,
            },
            text: Some(text.to_string()),
            caption: None,
        }),
        channel_post: None,
        callback_query: None,
    }
}

#[allow(dead_code)]
pub fn channel_post(message_id: i64, text: Option<&str>, caption: Option<&str>) -> Update {
    Update {
        update_id: 3,
        message: None,
        channel_post: Some(Message {
            message_id,
            from: None,
            chat: Chat {
                id: -100123,
                kind: ChatKind::Channel,
            },
            text: text.map(str::to_string),
            caption: caption.map(str::to_string),
        }),
        callback_query: None,
    }
}

#[allow(dead_code)]
pub fn callback(user_id: i64, data: &str) -> Update {
    Update {
        update_id: 4,
        message: None,
        channel_post: None,
        callback_query: Some(CallbackQuery {
            id: "cb-1".into(),
            from: User { id: user_id },
            data: Some(data.to_string()),
            message: Some(Message {
                message_id: 50,
                from: None,
                chat: Chat {
                    id: user_id,
                    kind: ChatKind::Private,
                },
                text: Some("Verification: which of these is a fruit?".into()),
                caption: None,
            }),
        }),
    }
}
