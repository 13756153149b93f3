//! # Configuration Management Module
//!
//! Handles all configuration for the relay bot: the bot credential and webhook
//! address, the monitored source channel and destination group, the privileged
//! admin list, topic table location, and logging settings.
//!
//! Configuration is TOML, loaded once at startup. A small set of environment
//! variables can override the sensitive values so the config file never needs
//! to carry the live token:
//!
//! - `BOT_TOKEN` overrides `bot.token`
//! - `BASE_URL` overrides `bot.base_url`
//! - `ADMIN_IDS` overrides `bot.admin_ids` (comma-separated integers)
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! token = "123456:ABC..."
//! base_url = "https://bot.example.org"
//! source_channel = "@announcements"
//! destination_group = "@discussionhub"
//! admin_ids = [111111111]
//!
//! [storage]
//! topics_file = "data/topics.json"
//!
//! [logging]
//! level = "info"
//! file = "threadrelay.log"
//! ```
//!
//! Validation failures ([`RelayError::ConfigInvalid`]) are fatal at startup:
//! the process must not come up with an empty credential or an empty admin
//! list, since the entire command surface would be unreachable.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::relay::errors::RelayError;

/// Bot identity and routing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot API credential.
    pub token: String,
    /// Externally reachable base address the webhook is registered under.
    pub base_url: String,
    /// Channel whose posts are routed (informational; the bot must be a member).
    pub source_channel: String,
    /// Group (with forum topics enabled) that posts are copied into.
    pub destination_group: String,
    /// Privileged user identities. Immutable at runtime.
    pub admin_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON topic table.
    pub topics_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Apply environment overrides for credentials and the admin list.
    pub fn apply_env(&mut self) -> Result<(), RelayError> {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            self.bot.token = token;
        }
        if let Ok(url) = std::env::var("BASE_URL") {
            self.bot.base_url = url;
        }
        if let Ok(ids) = std::env::var("ADMIN_IDS") {
            self.bot.admin_ids = parse_admin_ids(&ids)?;
        }
        Ok(())
    }

    /// Reject configurations the bot cannot run with.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.bot.token.trim().is_empty() {
            return Err(RelayError::ConfigInvalid("bot.token is empty".into()));
        }
        if self.bot.base_url.trim().is_empty() {
            return Err(RelayError::ConfigInvalid("bot.base_url is empty".into()));
        }
        if self.bot.destination_group.trim().is_empty() {
            return Err(RelayError::ConfigInvalid(
                "bot.destination_group is empty".into(),
            ));
        }
        if self.bot.admin_ids.is_empty() {
            return Err(RelayError::ConfigInvalid(
                "bot.admin_ids is empty; at least one admin is required".into(),
            ));
        }
        Ok(())
    }
}

/// Parse a comma-separated admin identity list, e.g. `"111,222, 333"`.
pub fn parse_admin_ids(raw: &str) -> Result<Vec<i64>, RelayError> {
    let mut ids = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id: i64 = part.parse().map_err(|_| {
            RelayError::ConfigInvalid(format!("malformed admin id '{}' in ADMIN_IDS", part))
        })?;
        ids.push(id);
    }
    if ids.is_empty() {
        return Err(RelayError::ConfigInvalid("ADMIN_IDS contains no ids".into()));
    }
    Ok(ids)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot: BotConfig {
                token: String::new(),
                base_url: String::new(),
                source_channel: "@yourchannel".to_string(),
                destination_group: "@yourgroup".to_string(),
                admin_ids: Vec::new(),
            },
            storage: StorageConfig {
                topics_file: "data/topics.json".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("threadrelay.log".to_string()),
            },
        }
    }
}
