//! Message identity types for msgbridge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A globally unique message identifier.
///
/// Server- or client-generated. The guid is the **merge key** for a
/// conversation's message list: optimistic placeholders are replaced by their
/// confirmed counterparts through it, and history pages are deduplicated
/// against it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageGuid(String);

impl MessageGuid {
    /// Wrap a guid received from the bridge.
    pub fn new(guid: impl Into<String>) -> Self {
        Self(guid.into())
    }

    /// Generate a locally unique guid for an optimistic placeholder.
    pub fn local() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the guid as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for MessageGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageGuid({})", self.0)
    }
}

impl From<&str> for MessageGuid {
    fn from(guid: &str) -> Self {
        Self::new(guid)
    }
}

/// A server-assigned 64-bit message row identifier.
///
/// Negative values denote a not-yet-confirmed optimistic message; the server
/// never assigns them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    /// Wrap a server-assigned id.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The id carried by an optimistic placeholder before confirmation.
    pub fn placeholder() -> Self {
        Self(-1)
    }

    /// Get the numeric value of this id.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Whether this id belongs to an unconfirmed optimistic message.
    pub fn is_placeholder(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}
