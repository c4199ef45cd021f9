//! Conversations, messages, and real-time wire events.

use serde::{Deserialize, Serialize};

use crate::{MessageGuid, MessageId, WireError};

/// A participant address on the bridged service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handle {
    /// Service-assigned handle row id.
    pub id: String,
    /// The deliverable address (phone number or account id).
    pub address: String,
    /// Which service the address belongs to.
    pub service: String,
    /// Resolved contact name, when the bridge knows one.
    #[serde(default)]
    pub contact_name: Option<String>,
}

/// A conversation as the bridge reports it.
///
/// Conversations are value objects: whenever any field changes, the ordering
/// engine replaces the whole entry rather than patching it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Stable service-assigned identity; may embed routing info.
    pub id: String,
    /// Globally unique conversation guid.
    pub guid: String,
    /// User-visible name, when the service carries one.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Ordered participant list.
    #[serde(default)]
    pub participants: Vec<Handle>,
    /// Most recent message, for list previews.
    #[serde(default)]
    pub last_message: Option<Message>,
    /// Whether the service flags this conversation as a group.
    #[serde(default)]
    pub is_group: bool,
    /// Present iff the conversation is pinned; lower = higher priority.
    #[serde(default)]
    pub pinned_index: Option<u32>,
}

impl Conversation {
    /// Whether this conversation is pinned.
    pub fn is_pinned(&self) -> bool {
        self.pinned_index.is_some()
    }

    /// Resolve the destination a send to this conversation should target.
    ///
    /// A 1:1 conversation (exactly one participant, no group flag) targets
    /// the participant's address; a group conversation targets the
    /// conversation's own id and the remote side resolves fan-out. Returns
    /// `None` when there are no participants and no group flag, which is a
    /// precondition failure at the send site.
    pub fn recipient(&self) -> Option<Recipient> {
        if !self.is_group && self.participants.len() == 1 {
            return Some(Recipient::Address(self.participants[0].address.clone()));
        }
        if self.is_group || !self.participants.is_empty() {
            return Some(Recipient::Chat(self.id.clone()));
        }
        None
    }
}

/// Where an outgoing message is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// A single participant's address (1:1 conversation).
    Address(String),
    /// A conversation id; the remote side resolves fan-out (group).
    Chat(String),
}

impl Recipient {
    /// The raw destination string handed to the transport.
    pub fn as_str(&self) -> &str {
        match self {
            Recipient::Address(address) => address,
            Recipient::Chat(id) => id,
        }
    }
}

/// A single message within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned row id; negative while optimistic.
    pub id: MessageId,
    /// The merge key. Always present.
    pub guid: MessageGuid,
    /// Message body, absent for attachment-only messages.
    #[serde(default)]
    pub text: Option<String>,
    /// Unix epoch milliseconds.
    pub date: u64,
    /// Whether the local account authored this message.
    pub is_from_me: bool,
    /// Sender handle id, absent for own messages.
    #[serde(default)]
    pub handle_id: Option<String>,
    /// Owning conversation.
    pub conversation_id: String,
    /// Attached media metadata.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Guid of the message this one replies to.
    #[serde(default)]
    pub reply_to_guid: Option<MessageGuid>,
    /// Guid of the thread originator, for threaded replies.
    #[serde(default)]
    pub thread_originator_guid: Option<MessageGuid>,
}

/// Metadata for a media attachment. Bytes are fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Server-assigned attachment id.
    pub id: i64,
    /// MIME type, when known.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Original filename, when known.
    #[serde(default)]
    pub filename: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub total_bytes: u64,
}

/// The reaction palette of the bridged service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TapbackKind {
    /// Heart.
    Love,
    /// Thumbs up.
    Like,
    /// Thumbs down.
    Dislike,
    /// "Ha ha".
    Laugh,
    /// Double exclamation.
    Emphasize,
    /// Question mark.
    Question,
}

/// Whether a tapback was attached or withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TapbackAction {
    /// The reaction was added.
    Added,
    /// The reaction was removed.
    Removed,
}

/// One entry of a complete pin set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinAssignment {
    /// The pinned conversation.
    pub conversation_id: String,
    /// Pin priority; lower sorts first.
    pub index: u32,
}

/// A real-time event pushed by the bridge.
///
/// Wire events arrive as raw JSON; [`PushEvent::from_value`] performs the
/// typed decoding. A value that fails to decode is dropped by the router
/// without affecting the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PushEvent {
    /// A message was delivered to (or echoed back by) the service.
    #[serde(rename_all = "camelCase")]
    NewMessage {
        /// The delivered message.
        message: Message,
        /// Display name of the sender, when the bridge resolved one.
        #[serde(default)]
        sender_name: Option<String>,
    },
    /// A reaction was added to or removed from a message.
    #[serde(rename_all = "camelCase")]
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
    /// The bridge could not sync some per-conversation state.
    #[serde(rename_all = "camelCase")]
    SyncWarning {
        /// The affected conversation.
        conversation_id: String,
        /// Human-readable advisory text.
        message: String,
    },
    /// A previously reported sync warning no longer applies.
    #[serde(rename_all = "camelCase")]
    SyncWarningCleared {
        /// The affected conversation.
        conversation_id: String,
    },
    /// The complete pin set changed.
    #[serde(rename_all = "camelCase")]
    PinnedChanged {
        /// The full new pin set; conversations absent here are unpinned.
        pins: Vec<PinAssignment>,
    },
}

impl PushEvent {
    /// Decode a raw wire event.
    pub fn from_value(value: serde_json::Value) -> Result<Self, WireError> {
        serde_json::from_value(value).map_err(WireError::EventDecode)
    }
}
