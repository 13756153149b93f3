//! Per-admin transient state for the multi-step keyword-edit flow.
//!
//! A pending action exists only while an admin is mid-flow. It is created
//! when they pick "Add Keyword" or "Remove Keyword" and advanced on each
//! valid reply; completion or any navigation back to a menu discards it. At
//! most one pending action per user; starting a new flow replaces the old one.
//!
//! The two-step shape makes illegal states unrepresentable: a keyword can only
//! be entered once a topic is bound.

use std::collections::HashMap;

/// Which mutation the flow will perform once the keyword is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Add,
    Remove,
}

impl EditKind {
    pub fn verb(self) -> &'static str {
        match self {
            EditKind::Add => "add",
            EditKind::Remove => "remove",
        }
    }
}

/// One in-progress keyword edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// Waiting for the admin to name an existing topic.
    ChoosingTopic { kind: EditKind },
    /// Topic bound; waiting for the keyword text.
    EnteringKeyword { kind: EditKind, topic: String },
}

/// Pending actions keyed by user identity.
#[derive(Debug, Default)]
pub struct SessionMap {
    pending: HashMap<i64, PendingAction>,
}

impl SessionMap {
    pub fn new() -> Self {
        SessionMap::default()
    }

    /// Start a new edit flow, replacing any previous one for this user.
    pub fn begin(&mut self, user: i64, kind: EditKind) {
        self.pending
            .insert(user, PendingAction::ChoosingTopic { kind });
    }

    pub fn get(&self, user: i64) -> Option<&PendingAction> {
        self.pending.get(&user)
    }

    pub fn set(&mut self, user: i64, action: PendingAction) {
        self.pending.insert(user, action);
    }

    /// Discard any pending action unconditionally.
    pub fn clear(&mut self, user: i64) {
        self.pending.remove(&user);
    }

    pub fn is_active(&self, user: i64) -> bool {
        self.pending.contains_key(&user)
    }
}
