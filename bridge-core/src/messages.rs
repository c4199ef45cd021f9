//! Per-conversation message logs for msgbridge.
//!
//! Each conversation holds a newest-first ordered list plus an auxiliary
//! guid→index map, so replace-by-key (the optimistic→confirmed transition)
//! is a lookup instead of an O(n) scan.
//!
//! Invariant: within one conversation's list, `guid` is unique at every
//! point in time, across any sequence of `replace_all` / `append_older` /
//! `insert_newest` calls.

use std::collections::HashMap;

use bridge_types::{Message, MessageGuid};

/// One conversation's ordered log.
#[derive(Debug, Default)]
struct ConversationLog {
    /// Messages, newest first.
    ordered: Vec<Message>,
    /// guid → position in `ordered`.
    index: HashMap<MessageGuid, usize>,
}

impl ConversationLog {
    fn replace_all(&mut self, messages: Vec<Message>) {
        self.ordered.clear();
        self.index.clear();
        for message in messages {
            if self.index.contains_key(&message.guid) {
                continue;
            }
            self.index.insert(message.guid.clone(), self.ordered.len());
            self.ordered.push(message);
        }
    }

    fn append_older(&mut self, older: Vec<Message>) -> usize {
        let mut accepted = 0;
        for message in older {
            if self.index.contains_key(&message.guid) {
                continue;
            }
            self.index.insert(message.guid.clone(), self.ordered.len());
            self.ordered.push(message);
            accepted += 1;
        }
        accepted
    }

    fn insert_newest(&mut self, message: Message) {
        if let Some(&position) = self.index.get(&message.guid) {
            self.ordered[position] = message;
            return;
        }
        for position in self.index.values_mut() {
            *position += 1;
        }
        self.index.insert(message.guid.clone(), 0);
        self.ordered.insert(0, message);
    }

    fn replace_by_guid(&mut self, guid: &MessageGuid, replacement: Message) -> bool {
        let Some(position) = self.index.get(guid).copied() else {
            return false;
        };
        if replacement.guid != *guid && self.index.contains_key(&replacement.guid) {
            // The replacement already landed through another path (push echo
            // raced the send completion); dropping the placeholder keeps the
            // guid set duplicate-free.
            self.remove_at(position);
            return true;
        }
        self.index.remove(guid);
        self.index.insert(replacement.guid.clone(), position);
        self.ordered[position] = replacement;
        true
    }

    fn remove_by_guid(&mut self, guid: &MessageGuid) -> Option<Message> {
        let position = self.index.get(guid).copied()?;
        Some(self.remove_at(position))
    }

    fn remove_at(&mut self, position: usize) -> Message {
        let removed = self.ordered.remove(position);
        self.index.remove(&removed.guid);
        for other in self.index.values_mut() {
            if *other > position {
                *other -= 1;
            }
        }
        removed
    }
}

/// Message logs for all conversations.
#[derive(Debug, Default)]
pub struct MessageLog {
    conversations: HashMap<String, ConversationLog>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the first page verbatim (newest-first as fetched), discarding
    /// anything previously held for the conversation.
    pub fn replace_all(&mut self, conversation_id: &str, messages: Vec<Message>) {
        self.conversations
            .entry(conversation_id.to_string())
            .or_default()
            .replace_all(messages);
    }

    /// Append an older history page after the existing messages.
    ///
    /// Messages whose guid is already present anywhere in the conversation
    /// are skipped. Returns the count actually appended.
    pub fn append_older(&mut self, conversation_id: &str, older: Vec<Message>) -> usize {
        self.conversations
            .entry(conversation_id.to_string())
            .or_default()
            .append_older(older)
    }

    /// Insert a push-delivered or optimistically sent message at the front.
    ///
    /// If a message with the same guid already exists it is replaced in
    /// place, which carries an optimistic placeholder over to its confirmed
    /// form without disturbing its position.
    pub fn insert_newest(&mut self, conversation_id: &str, message: Message) {
        self.conversations
            .entry(conversation_id.to_string())
            .or_default()
            .insert_newest(message);
    }

    /// Substitute the message stored under `guid` at its current position.
    ///
    /// Used when a send confirmation comes back under a server-minted guid:
    /// the placeholder guid is the search key and the confirmed message takes
    /// its slot. Returns false when the guid is not present.
    pub fn replace_by_guid(
        &mut self,
        conversation_id: &str,
        guid: &MessageGuid,
        replacement: Message,
    ) -> bool {
        match self.conversations.get_mut(conversation_id) {
            Some(log) => log.replace_by_guid(guid, replacement),
            None => false,
        }
    }

    /// Remove the message stored under `guid` (failed optimistic send).
    pub fn remove_by_guid(
        &mut self,
        conversation_id: &str,
        guid: &MessageGuid,
    ) -> Option<Message> {
        self.conversations
            .get_mut(conversation_id)?
            .remove_by_guid(guid)
    }

    /// The conversation's messages, newest first. Empty when unknown.
    pub fn messages(&self, conversation_id: &str) -> &[Message] {
        self.conversations
            .get(conversation_id)
            .map(|log| log.ordered.as_slice())
            .unwrap_or(&[])
    }

    /// Whether any conversation holds messages.
    pub fn is_empty(&self) -> bool {
        self.conversations.values().all(|log| log.ordered.is_empty())
    }

    /// Drop every conversation's log (disconnect).
    pub fn clear(&mut self) {
        self.conversations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_types::MessageId;
    use std::collections::HashSet;

    fn message(guid: &str, text: &str) -> Message {
        Message {
            id: MessageId::new(1),
            guid: MessageGuid::new(guid),
            text: Some(text.to_string()),
            date: 1_754_400_000_000,
            is_from_me: false,
            handle_id: Some("handle-1".to_string()),
            conversation_id: "chat-1".to_string(),
            attachments: Vec::new(),
            reply_to_guid: None,
            thread_originator_guid: None,
        }
    }

    fn guids(log: &MessageLog, conversation_id: &str) -> Vec<String> {
        log.messages(conversation_id)
            .iter()
            .map(|m| m.guid.as_str().to_string())
            .collect()
    }

    fn assert_no_duplicate_guids(log: &MessageLog, conversation_id: &str) {
        let all = guids(log, conversation_id);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), unique.len(), "duplicate guid in {all:?}");
    }

    #[test]
    fn replace_all_stores_verbatim() {
        let mut log = MessageLog::new();
        log.replace_all("chat-1", vec![message("c", "3"), message("b", "2"), message("a", "1")]);

        assert_eq!(guids(&log, "chat-1"), vec!["c", "b", "a"]);
    }

    #[test]
    fn replace_all_discards_previous_content() {
        let mut log = MessageLog::new();
        log.replace_all("chat-1", vec![message("old", "x")]);
        log.replace_all("chat-1", vec![message("new", "y")]);

        assert_eq!(guids(&log, "chat-1"), vec!["new"]);
    }

    #[test]
    fn append_older_goes_after_existing() {
        let mut log = MessageLog::new();
        log.replace_all("chat-1", vec![message("b", "2"), message("a", "1")]);

        let accepted = log.append_older("chat-1", vec![message("z", "0"), message("y", "-1")]);

        assert_eq!(accepted, 2);
        assert_eq!(guids(&log, "chat-1"), vec!["b", "a", "z", "y"]);
    }

    #[test]
    fn append_older_skips_known_guids() {
        let mut log = MessageLog::new();
        log.replace_all("chat-1", vec![message("b", "2"), message("a", "1")]);

        let accepted = log.append_older("chat-1", vec![message("a", "dup"), message("z", "0")]);

        assert_eq!(accepted, 1);
        assert_eq!(guids(&log, "chat-1"), vec!["b", "a", "z"]);
        assert_no_duplicate_guids(&log, "chat-1");
    }

    #[test]
    fn insert_newest_goes_to_front() {
        let mut log = MessageLog::new();
        log.replace_all("chat-1", vec![message("a", "1")]);

        log.insert_newest("chat-1", message("b", "2"));

        assert_eq!(guids(&log, "chat-1"), vec!["b", "a"]);
    }

    #[test]
    fn insert_newest_replaces_same_guid_in_place() {
        let mut log = MessageLog::new();
        log.replace_all("chat-1", vec![message("b", "2"), message("a", "1")]);

        log.insert_newest("chat-1", message("a", "edited"));

        assert_eq!(guids(&log, "chat-1"), vec!["b", "a"]);
        assert_eq!(log.messages("chat-1")[1].text.as_deref(), Some("edited"));
        assert_no_duplicate_guids(&log, "chat-1");
    }

    #[test]
    fn replace_by_guid_substitutes_at_same_position() {
        let mut log = MessageLog::new();
        log.replace_all(
            "chat-1",
            vec![message("c", "3"), message("placeholder", "2"), message("a", "1")],
        );

        let replaced = log.replace_by_guid(
            "chat-1",
            &MessageGuid::new("placeholder"),
            message("server-guid", "2"),
        );

        assert!(replaced);
        assert_eq!(guids(&log, "chat-1"), vec!["c", "server-guid", "a"]);
        assert_no_duplicate_guids(&log, "chat-1");
    }

    #[test]
    fn replace_by_guid_missing_key_is_noop() {
        let mut log = MessageLog::new();
        log.replace_all("chat-1", vec![message("a", "1")]);

        assert!(!log.replace_by_guid("chat-1", &MessageGuid::new("nope"), message("b", "2")));
        assert_eq!(guids(&log, "chat-1"), vec!["a"]);
    }

    #[test]
    fn replace_by_guid_drops_placeholder_when_echo_already_landed() {
        // The push stream can echo the confirmed message before the send
        // completion runs; the late replace must not duplicate the guid.
        let mut log = MessageLog::new();
        log.insert_newest("chat-1", message("placeholder", "hi"));
        log.insert_newest("chat-1", message("server-guid", "hi"));

        let replaced = log.replace_by_guid(
            "chat-1",
            &MessageGuid::new("placeholder"),
            message("server-guid", "hi"),
        );

        assert!(replaced);
        assert_eq!(guids(&log, "chat-1"), vec!["server-guid"]);
        assert_no_duplicate_guids(&log, "chat-1");
    }

    #[test]
    fn remove_by_guid_removes_and_reindexes() {
        let mut log = MessageLog::new();
        log.replace_all(
            "chat-1",
            vec![message("c", "3"), message("b", "2"), message("a", "1")],
        );

        let removed = log.remove_by_guid("chat-1", &MessageGuid::new("b"));
        assert_eq!(removed.unwrap().guid, MessageGuid::new("b"));
        assert_eq!(guids(&log, "chat-1"), vec!["c", "a"]);

        // Index stays coherent: replace-by-key still hits the right slot
        log.insert_newest("chat-1", message("d", "4"));
        assert!(log.replace_by_guid("chat-1", &MessageGuid::new("a"), message("a2", "1")));
        assert_eq!(guids(&log, "chat-1"), vec!["d", "c", "a2"]);
        assert_no_duplicate_guids(&log, "chat-1");
    }

    #[test]
    fn remove_unknown_guid_returns_none() {
        let mut log = MessageLog::new();
        assert!(log.remove_by_guid("chat-1", &MessageGuid::new("x")).is_none());
    }

    #[test]
    fn guids_stay_unique_under_mixed_traffic() {
        let mut log = MessageLog::new();
        log.replace_all("chat-1", vec![message("m3", "3"), message("m2", "2")]);
        log.append_older("chat-1", vec![message("m2", "dup"), message("m1", "1")]);
        log.insert_newest("chat-1", message("m4", "4"));
        log.insert_newest("chat-1", message("m3", "edited"));
        log.append_older("chat-1", vec![message("m4", "dup"), message("m0", "0")]);

        assert_eq!(guids(&log, "chat-1"), vec!["m4", "m3", "m2", "m1", "m0"]);
        assert_no_duplicate_guids(&log, "chat-1");
    }

    #[test]
    fn conversations_do_not_share_logs() {
        let mut log = MessageLog::new();
        log.insert_newest("chat-1", message("a", "1"));
        log.insert_newest("chat-2", message("a", "1"));

        assert_eq!(log.messages("chat-1").len(), 1);
        assert_eq!(log.messages("chat-2").len(), 1);
    }

    #[test]
    fn unknown_conversation_is_empty() {
        let log = MessageLog::new();
        assert!(log.messages("chat-404").is_empty());
    }

    #[test]
    fn clear_empties_all_conversations() {
        let mut log = MessageLog::new();
        log.insert_newest("chat-1", message("a", "1"));
        log.insert_newest("chat-2", message("b", "2"));

        log.clear();

        assert!(log.is_empty());
        assert!(log.messages("chat-1").is_empty());
        assert!(log.messages("chat-2").is_empty());
    }
}
