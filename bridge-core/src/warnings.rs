//! Per-conversation sync advisories for msgbridge.
//!
//! Presence of an entry means "show an advisory banner for this
//! conversation" (e.g. a read receipt could not sync). No merge logic —
//! last write wins.

use std::collections::HashMap;

/// Advisory warnings keyed by conversation id.
#[derive(Debug, Default)]
pub struct SyncWarnings {
    warnings: HashMap<String, String>,
}

impl SyncWarnings {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) the warning for a conversation.
    pub fn set(&mut self, conversation_id: &str, message: impl Into<String>) {
        self.warnings
            .insert(conversation_id.to_string(), message.into());
    }

    /// Clear the warning for a conversation.
    pub fn clear(&mut self, conversation_id: &str) {
        self.warnings.remove(conversation_id);
    }

    /// Clear every warning (disconnect).
    pub fn clear_all(&mut self) {
        self.warnings.clear();
    }

    /// The warning for a conversation, if any.
    pub fn get(&self, conversation_id: &str) -> Option<&str> {
        self.warnings.get(conversation_id).map(String::as_str)
    }

    /// Whether no warnings are present.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
