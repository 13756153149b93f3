//! # Relay Core Module
//!
//! The relay core turns inbound webhook updates into actions:
//!
//! - [`server`] - owns all mutable state and dispatches each update
//! - [`router`] - keyword matching for channel posts
//! - [`commands`] - the admin command set and its parser
//! - [`session`] - per-admin multi-step keyword-edit state machine
//! - [`challenge`] - one-shot verification check for private chats
//! - [`access`] - admin/verified/banned identity sets
//! - [`errors`] - the relay error taxonomy
//!
//! ## Dispatch
//!
//! ```text
//! webhook update ──► channel post ──► router ──► copy into matching threads
//!                ├─► callback     ──► challenge verdict
//!                └─► message      ──► /start trigger, or command dispatcher
//! ```
//!
//! Every update is handled to completion before the next one starts; the
//! webhook handler serializes them through a single lock, which is what makes
//! the lock-free interior (plain maps and sets) sound.

pub mod access;
pub mod challenge;
pub mod commands;
pub mod errors;
pub mod router;
pub mod server;
pub mod session;

pub use server::RelayServer;
