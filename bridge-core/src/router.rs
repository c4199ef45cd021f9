//! Push event routing for msgbridge.
//!
//! Every inbound real-time event is dispatched to exactly one store,
//! strictly in arrival order — no reordering, no batching. The router is a
//! pure function over the stores plus the selected-conversation pointer; it
//! returns an outcome describing what the client should do next (notify,
//! re-emit, nothing). A malformed raw event is dropped without affecting the
//! stream or any store.

use bridge_types::{Message, MessageGuid, PushEvent, TapbackAction, TapbackKind};

use crate::{ConversationList, MessageLog, SyncWarnings};

/// A notification the client should request from its notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyRequest {
    /// The message to present.
    pub message: Message,
    /// Resolved sender display name, when the bridge provided one.
    pub sender_name: Option<String>,
}

/// What routing one event did, and what the client owes in response.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterOutcome {
    /// A message was stored; `notify` is set when it warrants a local
    /// notification (inbound, and not the selected conversation).
    MessageStored {
        /// The conversation that changed.
        conversation_id: String,
        /// Notification request, when one is warranted.
        notify: Option<NotifyRequest>,
    },
    /// A tapback event to pass through to the UI layer; no store changed.
    Tapback {
        /// Which reaction.
        kind: TapbackKind,
        /// Added or removed.
        action: TapbackAction,
        /// The message the reaction targets.
        message_guid: MessageGuid,
        /// The conversation the message lives in.
        conversation_id: String,
    },
    /// A sync warning was set for the conversation.
    WarningSet {
        /// The affected conversation.
        conversation_id: String,
    },
    /// The conversation's sync warning was cleared.
    WarningCleared {
        /// The affected conversation.
        conversation_id: String,
    },
    /// The complete pin set was applied to the conversation list.
    PinsApplied,
    /// The raw event failed to decode and was dropped.
    Dropped {
        /// The decode failure, for logging.
        error: String,
    },
}

/// Route one raw wire event into the stores.
pub fn route(
    raw: serde_json::Value,
    selected_conversation: Option<&str>,
    messages: &mut MessageLog,
    conversations: &mut ConversationList,
    warnings: &mut SyncWarnings,
) -> RouterOutcome {
    let event = match PushEvent::from_value(raw) {
        Ok(event) => event,
        Err(error) => {
            return RouterOutcome::Dropped {
                error: error.to_string(),
            }
        }
    };

    match event {
        PushEvent::NewMessage {
            message,
            sender_name,
        } => {
            let conversation_id = message.conversation_id.clone();
            messages.insert_newest(&conversation_id, message.clone());
            conversations.record_message(&message);

            let notify = if !message.is_from_me
                && selected_conversation != Some(conversation_id.as_str())
            {
                Some(NotifyRequest {
                    message,
                    sender_name,
                })
            } else {
                None
            };
            RouterOutcome::MessageStored {
                conversation_id,
                notify,
            }
        }
        PushEvent::Tapback {
            kind,
            action,
            message_guid,
            conversation_id,
        } => RouterOutcome::Tapback {
            kind,
            action,
            message_guid,
            conversation_id,
        },
        PushEvent::SyncWarning {
            conversation_id,
            message,
        } => {
            warnings.set(&conversation_id, message);
            RouterOutcome::WarningSet { conversation_id }
        }
        PushEvent::SyncWarningCleared { conversation_id } => {
            warnings.clear(&conversation_id);
            RouterOutcome::WarningCleared { conversation_id }
        }
        PushEvent::PinnedChanged { pins } => {
            conversations.apply_pins(&pins);
            RouterOutcome::PinsApplied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_types::Conversation;
    use serde_json::json;

    struct Stores {
        messages: MessageLog,
        conversations: ConversationList,
        warnings: SyncWarnings,
    }

    impl Stores {
        fn with_conversations(ids: &[&str]) -> Self {
            let mut conversations = ConversationList::new();
            conversations.replace_all(
                ids.iter()
                    .map(|id| Conversation {
                        id: id.to_string(),
                        guid: format!("guid-{id}"),
                        display_name: None,
                        participants: Vec::new(),
                        last_message: None,
                        is_group: false,
                        pinned_index: None,
                    })
                    .collect(),
            );
            Self {
                messages: MessageLog::new(),
                conversations,
                warnings: SyncWarnings::new(),
            }
        }

        fn route(&mut self, raw: serde_json::Value, selected: Option<&str>) -> RouterOutcome {
            route(
                raw,
                selected,
                &mut self.messages,
                &mut self.conversations,
                &mut self.warnings,
            )
        }
    }

    fn new_message_event(conversation_id: &str, guid: &str, is_from_me: bool) -> serde_json::Value {
        json!({
            "type": "newMessage",
            "message": {
                "id": 99,
                "guid": guid,
                "text": "hello there",
                "date": 1_754_400_000_000u64,
                "isFromMe": is_from_me,
                "conversationId": conversation_id,
            },
            "senderName": "Ada",
        })
    }

    #[test]
    fn inbound_message_stores_reorders_and_notifies() {
        let mut stores = Stores::with_conversations(&["chat-1", "chat-2"]);

        let outcome = stores.route(new_message_event("chat-2", "m1", false), None);

        match outcome {
            RouterOutcome::MessageStored {
                conversation_id,
                notify,
            } => {
                assert_eq!(conversation_id, "chat-2");
                let notify = notify.expect("inbound unselected message should notify");
                assert_eq!(notify.sender_name.as_deref(), Some("Ada"));
            }
            other => panic!("expected MessageStored, got {other:?}"),
        }
        assert_eq!(stores.messages.messages("chat-2").len(), 1);
        assert_eq!(stores.conversations.conversations()[0].id, "chat-2");
    }

    #[test]
    fn selected_conversation_suppresses_notification() {
        let mut stores = Stores::with_conversations(&["chat-1"]);

        let outcome = stores.route(new_message_event("chat-1", "m1", false), Some("chat-1"));

        assert!(matches!(
            outcome,
            RouterOutcome::MessageStored { notify: None, .. }
        ));
    }

    #[test]
    fn own_message_suppresses_notification() {
        let mut stores = Stores::with_conversations(&["chat-1"]);

        let outcome = stores.route(new_message_event("chat-1", "m1", true), None);

        assert!(matches!(
            outcome,
            RouterOutcome::MessageStored { notify: None, .. }
        ));
        // But it is still stored and still drives recency
        assert_eq!(stores.messages.messages("chat-1").len(), 1);
    }

    #[test]
    fn tapback_passes_through_without_store_mutation() {
        let mut stores = Stores::with_conversations(&["chat-1"]);

        let outcome = stores.route(
            json!({
                "type": "tapback",
                "kind": "like",
                "action": "removed",
                "messageGuid": "m1",
                "conversationId": "chat-1",
            }),
            None,
        );

        assert_eq!(
            outcome,
            RouterOutcome::Tapback {
                kind: TapbackKind::Like,
                action: TapbackAction::Removed,
                message_guid: MessageGuid::new("m1"),
                conversation_id: "chat-1".to_string(),
            }
        );
        assert!(stores.messages.is_empty());
        assert!(stores.warnings.is_empty());
    }

    #[test]
    fn sync_warning_events_set_and_clear() {
        let mut stores = Stores::with_conversations(&["chat-1"]);

        stores.route(
            json!({
                "type": "syncWarning",
                "conversationId": "chat-1",
                "message": "read receipt could not sync",
            }),
            None,
        );
        assert_eq!(
            stores.warnings.get("chat-1"),
            Some("read receipt could not sync")
        );

        stores.route(
            json!({ "type": "syncWarningCleared", "conversationId": "chat-1" }),
            None,
        );
        assert_eq!(stores.warnings.get("chat-1"), None);
    }

    #[test]
    fn pinned_changed_applies_the_full_set() {
        let mut stores = Stores::with_conversations(&["a", "b", "c"]);

        let outcome = stores.route(
            json!({
                "type": "pinnedChanged",
                "pins": [
                    { "conversationId": "a", "index": 0 },
                    { "conversationId": "c", "index": 1 },
                ],
            }),
            None,
        );

        assert_eq!(outcome, RouterOutcome::PinsApplied);
        let list = &stores.conversations;
        assert_eq!(list.get("a").unwrap().pinned_index, Some(0));
        assert_eq!(list.get("b").unwrap().pinned_index, None);
        assert_eq!(list.get("c").unwrap().pinned_index, Some(1));
    }

    #[test]
    fn malformed_event_is_dropped_and_stream_continues() {
        let mut stores = Stores::with_conversations(&["chat-1"]);

        let outcome = stores.route(json!({ "type": "newMessage" }), None);
        assert!(matches!(outcome, RouterOutcome::Dropped { .. }));
        assert!(stores.messages.is_empty());

        // The next event still applies
        let outcome = stores.route(new_message_event("chat-1", "m1", false), None);
        assert!(matches!(outcome, RouterOutcome::MessageStored { .. }));
        assert_eq!(stores.messages.messages("chat-1").len(), 1);
    }
}
