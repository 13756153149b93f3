//! The admin command set.
//!
//! Inbound private text from an admin resolves to exactly one [`AdminCommand`]
//! variant, or to nothing at all. Unrecognized text is silently ignored so
//! stray chatter in the admin's own DM never produces error spam. Menu labels
//! are matched exactly; `/ban` and `/unban` are prefix-matched and carry their
//! raw argument for the dispatcher to parse.

/// Topic name used by the `Broadcast Test` command.
pub const BROADCAST_TEST_TOPIC: &str = "gift";

/// One resolved admin action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Open the keyword submenu, discarding any pending edit flow.
    ManageKeywords,
    /// Begin the add-keyword flow.
    AddKeyword,
    /// Begin the remove-keyword flow.
    RemoveKeyword,
    /// Return to the main menu, discarding any pending edit flow.
    BackToMenu,
    /// Topic and keyword counts plus the last reload time.
    Stats,
    /// Static command listing.
    Help,
    /// Re-run the topic table load.
    Reload,
    /// Ban the id carried as raw text (parsed by the dispatcher).
    Ban(String),
    /// Unban the id carried as raw text.
    Unban(String),
    /// Dump the verified set.
    ListVerified,
    /// Send a fixed test message to the well-known topic's thread.
    BroadcastTest,
}

impl AdminCommand {
    /// Resolve message text into a command, or `None` for unrecognized input.
    pub fn parse(text: &str) -> Option<AdminCommand> {
        match text {
            "Manage Keywords" => Some(AdminCommand::ManageKeywords),
            "Add Keyword" => Some(AdminCommand::AddKeyword),
            "Remove Keyword" => Some(AdminCommand::RemoveKeyword),
            "Back to Menu" => Some(AdminCommand::BackToMenu),
            "Stats" => Some(AdminCommand::Stats),
            "Help" | "/help" => Some(AdminCommand::Help),
            "/reload" => Some(AdminCommand::Reload),
            "/verified" => Some(AdminCommand::ListVerified),
            "Broadcast Test" => Some(AdminCommand::BroadcastTest),
            _ => {
                if let Some(arg) = text.strip_prefix("/ban ") {
                    Some(AdminCommand::Ban(arg.to_string()))
                } else if let Some(arg) = text.strip_prefix("/unban ") {
                    Some(AdminCommand::Unban(arg.to_string()))
                } else {
                    None
                }
            }
        }
    }
}
