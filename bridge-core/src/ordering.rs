//! Pin-aware conversation ordering for msgbridge.
//!
//! The list is two partitions: pinned conversations sorted ascending by
//! `pinned_index`, then unpinned conversations in recency order. Message
//! activity moves an unpinned conversation to the front of the unpinned
//! partition; pinned conversations never move from message activity — pin
//! order is authoritative.
//!
//! Conversations are value objects: any mutation replaces the whole entry.

use bridge_types::{Conversation, Message, PinAssignment};

/// The ordered, pin-aware conversation list.
#[derive(Debug, Default)]
pub struct ConversationList {
    ordered: Vec<Conversation>,
}

impl ConversationList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a bulk-fetched conversation set.
    ///
    /// Pinned entries sort ascending by `pinned_index`; unpinned entries keep
    /// the server-given relative order, which is treated as recency order.
    pub fn replace_all(&mut self, conversations: Vec<Conversation>) {
        self.ordered = conversations;
        self.rederive();
    }

    /// The current ordering.
    pub fn conversations(&self) -> &[Conversation] {
        &self.ordered
    }

    /// Look up a conversation by id.
    pub fn get(&self, conversation_id: &str) -> Option<&Conversation> {
        self.ordered.iter().find(|c| c.id == conversation_id)
    }

    /// Number of conversations held.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Record message activity for a conversation.
    ///
    /// Replaces the entry with `last_message` updated. An unpinned
    /// conversation moves to the front of the unpinned partition; a pinned
    /// one stays where pin order put it. Unknown conversation ids are
    /// ignored (the entry appears with the next full fetch).
    ///
    /// Returns whether the conversation was known.
    pub fn record_message(&mut self, message: &Message) -> bool {
        let Some(position) = self
            .ordered
            .iter()
            .position(|c| c.id == message.conversation_id)
        else {
            return false;
        };

        let mut updated = self.ordered[position].clone();
        updated.last_message = Some(message.clone());

        if updated.is_pinned() {
            self.ordered[position] = updated;
        } else {
            self.ordered.remove(position);
            let front = self.unpinned_start();
            self.ordered.insert(front, updated);
        }
        true
    }

    /// Apply a complete replacement pin set.
    ///
    /// Every conversation absent from the set loses its `pinned_index`;
    /// every conversation present gets the set's index. Ids not currently
    /// known are ignored — no entries are created. The full ordering is then
    /// re-derived. Applying the same set twice yields the same result.
    pub fn apply_pins(&mut self, pins: &[PinAssignment]) {
        for conversation in &mut self.ordered {
            let assigned = pins
                .iter()
                .find(|p| p.conversation_id == conversation.id)
                .map(|p| p.index);
            if conversation.pinned_index != assigned {
                let mut updated = conversation.clone();
                updated.pinned_index = assigned;
                *conversation = updated;
            }
        }
        self.rederive();
    }

    /// Drop the list (disconnect).
    pub fn clear(&mut self) {
        self.ordered.clear();
    }

    /// Index of the first unpinned entry (== number of pinned entries,
    /// given the partition invariant).
    fn unpinned_start(&self) -> usize {
        self.ordered
            .iter()
            .position(|c| !c.is_pinned())
            .unwrap_or(self.ordered.len())
    }

    /// Re-establish the partition invariant: pinned by index ascending,
    /// then unpinned in their current relative order.
    fn rederive(&mut self) {
        self.ordered
            .sort_by_key(|c| c.pinned_index.map_or((1, 0), |index| (0, index)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_types::{MessageGuid, MessageId};

    fn conversation(id: &str, pinned_index: Option<u32>) -> Conversation {
        Conversation {
            id: id.to_string(),
            guid: format!("guid-{id}"),
            display_name: None,
            participants: Vec::new(),
            last_message: None,
            is_group: false,
            pinned_index,
        }
    }

    fn message_for(conversation_id: &str, guid: &str) -> Message {
        Message {
            id: MessageId::new(7),
            guid: MessageGuid::new(guid),
            text: Some("hi".to_string()),
            date: 1_754_400_000_000,
            is_from_me: false,
            handle_id: None,
            conversation_id: conversation_id.to_string(),
            attachments: Vec::new(),
            reply_to_guid: None,
            thread_originator_guid: None,
        }
    }

    fn ids(list: &ConversationList) -> Vec<&str> {
        list.conversations().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn replace_all_partitions_pinned_first() {
        let mut list = ConversationList::new();
        list.replace_all(vec![
            conversation("b", None),
            conversation("p2", Some(2)),
            conversation("a", None),
            conversation("p1", Some(1)),
        ]);

        assert_eq!(ids(&list), vec!["p1", "p2", "b", "a"]);
    }

    #[test]
    fn new_message_moves_unpinned_to_front_of_unpinned() {
        let mut list = ConversationList::new();
        list.replace_all(vec![
            conversation("pinned", Some(0)),
            conversation("x", None),
            conversation("y", None),
            conversation("z", None),
        ]);

        let known = list.record_message(&message_for("z", "m1"));

        assert!(known);
        assert_eq!(ids(&list), vec!["pinned", "z", "x", "y"]);
        assert_eq!(
            list.get("z").unwrap().last_message.as_ref().unwrap().guid,
            MessageGuid::new("m1")
        );
    }

    #[test]
    fn new_message_never_moves_a_pinned_conversation() {
        let mut list = ConversationList::new();
        list.replace_all(vec![
            conversation("p1", Some(0)),
            conversation("p2", Some(1)),
            conversation("x", None),
        ]);

        list.record_message(&message_for("p2", "m1"));

        assert_eq!(ids(&list), vec!["p1", "p2", "x"]);
        assert!(list.get("p2").unwrap().last_message.is_some());
    }

    #[test]
    fn message_for_unknown_conversation_is_ignored() {
        let mut list = ConversationList::new();
        list.replace_all(vec![conversation("x", None)]);

        let known = list.record_message(&message_for("ghost", "m1"));

        assert!(!known);
        assert_eq!(ids(&list), vec!["x"]);
    }

    #[test]
    fn apply_pins_sets_and_clears_flags() {
        let mut list = ConversationList::new();
        list.replace_all(vec![
            conversation("a", None),
            conversation("b", Some(0)),
            conversation("c", None),
        ]);

        list.apply_pins(&[
            PinAssignment {
                conversation_id: "a".to_string(),
                index: 0,
            },
            PinAssignment {
                conversation_id: "c".to_string(),
                index: 1,
            },
        ]);

        assert_eq!(list.get("a").unwrap().pinned_index, Some(0));
        assert_eq!(list.get("b").unwrap().pinned_index, None);
        assert_eq!(list.get("c").unwrap().pinned_index, Some(1));
        assert_eq!(ids(&list), vec!["a", "c", "b"]);
    }

    #[test]
    fn apply_pins_is_idempotent() {
        let mut list = ConversationList::new();
        list.replace_all(vec![
            conversation("a", None),
            conversation("b", None),
            conversation("c", None),
        ]);
        let pins = vec![
            PinAssignment {
                conversation_id: "c".to_string(),
                index: 0,
            },
            PinAssignment {
                conversation_id: "a".to_string(),
                index: 1,
            },
        ];

        list.apply_pins(&pins);
        let first = ids(&list).join(",");
        list.apply_pins(&pins);
        let second = ids(&list).join(",");

        assert_eq!(first, second);
        assert_eq!(second, "c,a,b");
    }

    #[test]
    fn apply_pins_ignores_unknown_ids() {
        let mut list = ConversationList::new();
        list.replace_all(vec![conversation("a", None)]);

        list.apply_pins(&[PinAssignment {
            conversation_id: "ghost".to_string(),
            index: 0,
        }]);

        assert_eq!(list.len(), 1);
        assert!(list.get("ghost").is_none());
    }

    #[test]
    fn unpinning_returns_conversation_to_recency_partition() {
        let mut list = ConversationList::new();
        list.replace_all(vec![
            conversation("p", Some(0)),
            conversation("x", None),
            conversation("y", None),
        ]);

        list.apply_pins(&[]);

        // Former pin keeps its relative position, now as an unpinned entry
        assert_eq!(ids(&list), vec!["p", "x", "y"]);
        assert!(list.get("p").unwrap().pinned_index.is_none());

        // And recency applies to it again
        list.record_message(&message_for("y", "m1"));
        assert_eq!(ids(&list), vec!["y", "p", "x"]);
    }

    #[test]
    fn clear_drops_everything() {
        let mut list = ConversationList::new();
        list.replace_all(vec![conversation("a", None)]);

        list.clear();

        assert!(list.is_empty());
        assert!(list.get("a").is_none());
    }
}
