//! Relay server: owns all mutable state and processes every inbound update.
//!
//! `RelayServer` is generic over the [`TelegramApi`] transport so tests can
//! drive the full dispatch path with a recording mock. In production it is
//! wrapped in an `Arc<Mutex<..>>` and fed by the axum webhook handler; the
//! mutex is what enforces the one-update-at-a-time processing model, so the
//! interior needs no further synchronization.
//!
//! Error policy: nothing that happens while handling an update may escape as a
//! fault. Outbound send failures are logged (and, for forwards, reported to
//! every admin); topic table load/save failures are logged and leave the
//! in-memory table authoritative.

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::logutil::escape_log;
use crate::storage::TopicStore;
use crate::telegram::types::{CallbackQuery, ChatKind, Message, Update};
use crate::telegram::{
    admin_keyboard, inline_options, keyword_menu, ChatRef, SendOptions, TelegramApi,
};

use super::access::AccessControl;
use super::challenge;
use super::commands::{AdminCommand, BROADCAST_TEST_TOPIC};
use super::errors::RelayError;
use super::router::matching_topics;
use super::session::{EditKind, PendingAction, SessionMap};

pub struct RelayServer<A: TelegramApi> {
    config: Config,
    api: A,
    store: TopicStore,
    access: AccessControl,
    sessions: SessionMap,
}

impl<A: TelegramApi + 'static> RelayServer<A> {
    /// Build the server: validate config, load the topic table (a missing or
    /// corrupt table is logged, not fatal), seed the admin set.
    pub async fn new(config: Config, api: A) -> Result<Self> {
        config.validate()?;
        let mut store = TopicStore::new(&config.storage.topics_file);
        match store.load().await {
            Ok(()) => {
                let (topics, keywords) = store.stats();
                info!("topic table loaded: {} topics, {} keywords", topics, keywords);
            }
            Err(e) => warn!("starting with an empty topic table: {}", e),
        }
        let access = AccessControl::new(&config.bot.admin_ids);
        Ok(RelayServer {
            config,
            api,
            store,
            access,
            sessions: SessionMap::new(),
        })
    }

    pub fn topics(&self) -> &TopicStore {
        &self.store
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Register the webhook and serve it until the process is stopped.
    ///
    /// The token doubles as the webhook path secret: deliveries to any other
    /// path token are rejected with 404.
    pub async fn run(self, bind_addr: &str) -> Result<()> {
        let webhook_url = format!(
            "{}/webhook/{}",
            self.config.bot.base_url.trim_end_matches('/'),
            self.config.bot.token
        );
        self.api.set_webhook(&webhook_url).await?;
        info!("webhook registered");

        let token = self.config.bot.token.clone();
        let shared = Arc::new(Mutex::new(self));
        let app = Self::router(shared, &token);

        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        info!("listening on {}", bind_addr);
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Webhook router over a shared server handle. `token` is the expected
    /// path secret; deliveries to any other path are rejected with 404.
    pub fn router(shared: Arc<Mutex<Self>>, token: &str) -> Router {
        let state = AppState {
            token: Arc::new(token.to_string()),
            server: shared,
        };
        Router::new()
            .route("/", get(health))
            .route("/webhook/:token", post(webhook::<A>))
            .with_state(state)
    }

    /// Entry point for one inbound update. Never returns an error; every
    /// failure path is handled inside.
    pub async fn handle_update(&mut self, update: Update) {
        debug!("update {}", update.update_id);
        if let Some(post) = update.channel_post {
            self.handle_channel_post(post).await;
        } else if let Some(query) = update.callback_query {
            self.handle_callback(query).await;
        } else if let Some(message) = update.message {
            self.handle_message(message).await;
        }
    }

    // === Channel post routing ===

    async fn handle_channel_post(&mut self, post: Message) {
        let text = post.text_or_caption();
        // Collect owned matches first; the copy calls below need &mut access elsewhere.
        let matches: Vec<(String, i64)> = matching_topics(text, self.store.topics())
            .into_iter()
            .filter_map(|name| {
                self.store
                    .get(name)
                    .map(|topic| (name.to_string(), topic.thread_id))
            })
            .collect();
        if matches.is_empty() {
            return;
        }
        debug!(
            "post {} in chat {} matches {} topic(s): {}",
            post.message_id,
            post.chat.id,
            matches.len(),
            escape_log(text)
        );

        let destination = ChatRef::Name(self.config.bot.destination_group.clone());
        for (name, thread_id) in matches {
            match self
                .api
                .copy_message(&destination, post.chat.id, post.message_id, thread_id)
                .await
            {
                Ok(()) => info!("forwarded post {} to #{}", post.message_id, name),
                Err(e) => {
                    let err = RelayError::ForwardFailed {
                        topic: name,
                        reason: e.to_string(),
                    };
                    warn!("{}", err);
                    self.notify_admins(&err.to_string()).await;
                }
            }
        }
    }

    /// Tell every admin individually. Send failures here are log-only.
    async fn notify_admins(&self, text: &str) {
        for admin in self.access.admins() {
            if let Err(e) = self
                .api
                .send_message(&ChatRef::Id(admin), text, SendOptions::default())
                .await
            {
                error!("could not notify admin {}: {}", admin, e);
            }
        }
    }

    // === Challenge verdicts ===

    async fn handle_callback(&mut self, query: CallbackQuery) {
        let user = query.from.id;
        let data = query.data.as_deref().unwrap_or("");
        let chat_id = query.message.as_ref().map(|m| m.chat.id);

        if challenge::is_correct(data) {
            self.access.verify(user);
            info!("user {} passed verification", user);
            self.answer(&query.id, "Verified!").await;
            if let Some(chat_id) = chat_id {
                self.send(chat_id, "You're verified!", None).await;
            }
        } else {
            debug!("user {} failed verification ({})", user, escape_log(data));
            self.answer(&query.id, "Wrong. Try again!").await;
            if let Some(chat_id) = chat_id {
                self.send(chat_id, "Wrong answer. Use /start to retry.", None)
                    .await;
            }
        }
    }

    // === Private messages ===

    async fn handle_message(&mut self, msg: Message) {
        let Some(from) = msg.from.as_ref() else {
            return;
        };
        let user = from.id;
        let chat_id = msg.chat.id;
        let is_private = msg.chat.kind == ChatKind::Private;
        let text = msg.text.as_deref().unwrap_or("");

        if is_private && text.starts_with("/start") {
            self.handle_start(user, chat_id).await;
            return;
        }

        // Admins bypass both the ban and verification checks.
        if !self.access.is_admin(user) {
            if self.access.is_banned(user) {
                self.send(chat_id, "You are banned.", None).await;
            } else if !self.access.is_verified(user) && is_private {
                self.send(chat_id, "Please complete verification using /start.", None)
                    .await;
            }
            return;
        }

        // A pending edit flow consumes the whole message.
        if let Some(action) = self.sessions.get(user).cloned() {
            self.advance_session(user, chat_id, text, action).await;
            return;
        }

        match AdminCommand::parse(text) {
            Some(command) => self.run_admin_command(user, chat_id, command).await,
            None => debug!("ignoring admin text from {}: {}", user, escape_log(text)),
        }
    }

    async fn handle_start(&mut self, user: i64, chat_id: i64) {
        if self.access.is_admin(user) {
            // Admins count as verified; any half-finished edit flow is
            // abandoned on a fresh /start.
            self.access.verify(user);
            self.sessions.clear(user);
            self.send(chat_id, "Welcome, admin!", Some(admin_keyboard()))
                .await;
            return;
        }
        if self.access.is_banned(user) {
            self.send(chat_id, "You are banned.", None).await;
            return;
        }
        if self.access.is_verified(user) {
            self.send(chat_id, "You are already verified.", None).await;
            return;
        }
        let options = challenge::challenge_options();
        let markup = inline_options(&options);
        self.send(chat_id, challenge::QUESTION, Some(markup)).await;
    }

    // === Keyword edit flow ===

    async fn advance_session(
        &mut self,
        user: i64,
        chat_id: i64,
        text: &str,
        action: PendingAction,
    ) {
        // Menu navigation discards the flow before anything else.
        if let Some(command @ (AdminCommand::BackToMenu | AdminCommand::ManageKeywords)) =
            AdminCommand::parse(text)
        {
            self.sessions.clear(user);
            self.run_admin_command(user, chat_id, command).await;
            return;
        }

        match action {
            PendingAction::ChoosingTopic { kind } => {
                if self.store.get(text).is_none() {
                    self.send(chat_id, "Topic not found.", None).await;
                    return;
                }
                self.sessions.set(
                    user,
                    PendingAction::EnteringKeyword {
                        kind,
                        topic: text.to_string(),
                    },
                );
                self.send(chat_id, &format!("Enter keyword to {}:", kind.verb()), None)
                    .await;
            }
            PendingAction::EnteringKeyword { kind, topic } => {
                let keyword = text.trim();
                if keyword.is_empty() {
                    self.send(chat_id, "Invalid keyword.", None).await;
                    return;
                }
                let result = match kind {
                    EditKind::Add => self.store.add_keyword(&topic, keyword),
                    EditKind::Remove => self.store.remove_keyword(&topic, keyword),
                };
                match result {
                    Ok(()) => {
                        self.persist_and_reload().await;
                        self.sessions.clear(user);
                        let confirmation = match kind {
                            EditKind::Add => {
                                format!("Added keyword \"{}\" to \"{}\"", keyword, topic)
                            }
                            EditKind::Remove => {
                                format!("Removed keyword \"{}\" from \"{}\"", keyword, topic)
                            }
                        };
                        info!(
                            "admin {} {} keyword {} on topic {}",
                            user,
                            kind.verb(),
                            escape_log(keyword),
                            escape_log(&topic)
                        );
                        self.send(chat_id, &confirmation, None).await;
                        self.send(chat_id, "Returning to menu.", Some(admin_keyboard()))
                            .await;
                    }
                    Err(e) => {
                        // Topic vanished between steps (e.g. edited on disk + reloaded).
                        self.sessions.clear(user);
                        self.send(chat_id, &format!("{}", e), None).await;
                    }
                }
            }
        }
    }

    /// Save-then-reload after every mutation: a write failure shows up as
    /// stale data on the reload instead of drifting silently.
    async fn persist_and_reload(&mut self) {
        if let Err(e) = self.store.save().await {
            error!("{}", e);
        }
        if let Err(e) = self.store.load().await {
            error!("{}", e);
        }
    }

    // === One-shot admin commands ===

    async fn run_admin_command(&mut self, user: i64, chat_id: i64, command: AdminCommand) {
        match command {
            AdminCommand::ManageKeywords => {
                self.sessions.clear(user);
                self.send(chat_id, "Choose an action:", Some(keyword_menu()))
                    .await;
            }
            AdminCommand::AddKeyword => {
                self.begin_edit(user, chat_id, EditKind::Add).await;
            }
            AdminCommand::RemoveKeyword => {
                self.begin_edit(user, chat_id, EditKind::Remove).await;
            }
            AdminCommand::BackToMenu => {
                self.sessions.clear(user);
                self.send(chat_id, "Returned to main menu.", Some(admin_keyboard()))
                    .await;
            }
            AdminCommand::Stats => {
                let (topics, keywords) = self.store.stats();
                let last_reload = self
                    .store
                    .last_reload()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "never".to_string());
                let text = format!(
                    "Bot stats:\n- Topics: {}\n- Keywords: {}\n- Last reload: {}",
                    topics, keywords, last_reload
                );
                self.send(chat_id, &text, Some(admin_keyboard())).await;
            }
            AdminCommand::Help => {
                let text = "Admin commands:\n\
                            - Manage Keywords\n\
                            - Stats\n\
                            - Broadcast Test\n\
                            - /reload, /ban <id>, /unban <id>, /verified";
                self.send(chat_id, text, Some(admin_keyboard())).await;
            }
            AdminCommand::Reload => match self.store.load().await {
                Ok(()) => {
                    self.send(chat_id, "Reloaded topic table.", Some(admin_keyboard()))
                        .await;
                }
                Err(e) => {
                    error!("{}", e);
                    self.send(chat_id, &format!("Reload failed: {}", e), None)
                        .await;
                }
            },
            AdminCommand::Ban(arg) => match arg.trim().parse::<i64>() {
                Ok(id) => {
                    self.access.ban(id);
                    info!("admin {} banned user {}", user, id);
                    self.send(chat_id, &format!("Banned user {}", id), None).await;
                }
                Err(_) => {
                    self.send(chat_id, "Usage: /ban <numeric id>", None).await;
                }
            },
            AdminCommand::Unban(arg) => match arg.trim().parse::<i64>() {
                Ok(id) => {
                    self.access.unban(id);
                    info!("admin {} unbanned user {}", user, id);
                    self.send(chat_id, &format!("Unbanned user {}", id), None)
                        .await;
                }
                Err(_) => {
                    self.send(chat_id, "Usage: /unban <numeric id>", None).await;
                }
            },
            AdminCommand::ListVerified => {
                let verified = self.access.verified_users();
                let text = if verified.is_empty() {
                    "Verified users:\nNone".to_string()
                } else {
                    let lines: Vec<String> =
                        verified.iter().map(|id| id.to_string()).collect();
                    format!("Verified users:\n{}", lines.join("\n"))
                };
                self.send(chat_id, &text, None).await;
            }
            AdminCommand::BroadcastTest => {
                let Some(thread_id) = self.store.get(BROADCAST_TEST_TOPIC).map(|t| t.thread_id)
                else {
                    self.send(
                        chat_id,
                        &format!("'{}' topic not found.", BROADCAST_TEST_TOPIC),
                        None,
                    )
                    .await;
                    return;
                };
                let destination = ChatRef::Name(self.config.bot.destination_group.clone());
                let text = format!("Test message to the {} thread", BROADCAST_TEST_TOPIC);
                match self
                    .api
                    .send_message(&destination, &text, SendOptions::in_thread(thread_id))
                    .await
                {
                    Ok(()) => self.send(chat_id, "Test broadcasted.", None).await,
                    Err(e) => {
                        warn!("broadcast test to {} failed: {}", destination, e);
                        self.send(chat_id, &format!("Failed: {}", e), None).await;
                    }
                }
            }
        }
    }

    async fn begin_edit(&mut self, user: i64, chat_id: i64, kind: EditKind) {
        self.sessions.begin(user, kind);
        let available = self.store.topic_names().join(", ");
        let prompt = format!(
            "Enter topic name to {} keyword:\n(Available: {})",
            kind.verb(),
            available
        );
        self.send(chat_id, &prompt, None).await;
    }

    // === Outbound helpers ===

    /// Send to a chat id, logging (not propagating) any failure.
    async fn send(&self, chat_id: i64, text: &str, markup: Option<serde_json::Value>) {
        let opts = match markup {
            Some(markup) => SendOptions::with_markup(markup),
            None => SendOptions::default(),
        };
        if let Err(e) = self
            .api
            .send_message(&ChatRef::Id(chat_id), text, opts)
            .await
        {
            error!("send to {} failed: {}", chat_id, e);
        }
    }

    async fn answer(&self, callback_id: &str, text: &str) {
        if let Err(e) = self.api.answer_callback_query(callback_id, text).await {
            error!("answer callback {} failed: {}", callback_id, e);
        }
    }
}

struct AppState<A: TelegramApi> {
    token: Arc<String>,
    server: Arc<Mutex<RelayServer<A>>>,
}

// Manual impl: `derive(Clone)` would demand `A: Clone`.
impl<A: TelegramApi> Clone for AppState<A> {
    fn clone(&self) -> Self {
        AppState {
            token: self.token.clone(),
            server: self.server.clone(),
        }
    }
}

async fn webhook<A: TelegramApi + 'static>(
    Path(token): Path<String>,
    State(state): State<AppState<A>>,
    Json(update): Json<Update>,
) -> StatusCode {
    // Reject before taking the mutex so bad deliveries never queue behind
    // real updates.
    if token != *state.token {
        return StatusCode::NOT_FOUND;
    }
    state.server.lock().await.handle_update(update).await;
    // The platform retries non-2xx deliveries; processing failures are
    // already handled internally, so always acknowledge.
    StatusCode::OK
}

async fn health() -> &'static str {
    "Bot is running."
}
