//! # Threadrelay - Keyword-routing relay bot
//!
//! Threadrelay watches a broadcast channel and copies matching posts into the
//! forum topic threads of a destination group. Routing is driven by a
//! human-editable keyword table, and a small admin surface over private
//! messages lets statically configured operators edit that table, manage a ban
//! list, and inspect runtime state. Everyone else is gated behind a one-shot
//! multiple-choice verification check.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use threadrelay::config::Config;
//! use threadrelay::relay::RelayServer;
//! use threadrelay::telegram::BotClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let api = BotClient::new(&config.bot.token);
//!     let server = RelayServer::new(config, api).await?;
//!     server.run("0.0.0.0:3000").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`relay`] - Core relay logic: update dispatch, routing, access control, sessions
//! - [`telegram`] - Bot API client, inbound update types, and keyboard builders
//! - [`storage`] - Topic table persistence (pretty-printed JSON)
//! - [`config`] - Configuration loading and validation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  RelayServer    │ ← webhook events, dispatch, admin commands
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Telegram       │ ← Bot API transport (reqwest)
//! │  Client         │
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Topic Store    │ ← keyword table persistence
//! └─────────────────┘
//! ```
//!
//! All inbound updates are processed one at a time in arrival order; the only
//! shared mutable state (topic table, identity sets, pending edit sessions) is
//! owned by the server and touched exclusively from that single event context.

pub mod config;
pub mod logutil;
pub mod relay;
pub mod storage;
pub mod telegram;
