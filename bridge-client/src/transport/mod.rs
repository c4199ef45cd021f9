//! Transport abstraction for msgbridge.
//!
//! This module provides a pluggable transport layer that abstracts the
//! underlying connection mechanism (WebSocket bridge, mock for testing).
//! The transport owns all network I/O and encryption; this crate only sees
//! typed results and raw push-event values.
//!
//! # Design
//!
//! The transport trait is async and connection-oriented:
//! - `connect()` establishes an authenticated session
//! - fetches are request/response with limit/offset pagination
//! - `start_push_stream()` registers an event sink once; the transport feeds
//!   every subsequent real-time event through it until stopped

mod mock;

pub use mock::{MockTransport, SentMessage};

use async_trait::async_trait;
use bridge_types::{Conversation, Message, MessageGuid, TapbackAction, TapbackKind};
use thiserror::Error;
use tokio::sync::mpsc;

/// Messages fetched per history page, and the short-page threshold that
/// infers the end of history.
pub const PAGE_SIZE: usize = 50;

/// Upper bound for the initial bulk conversation fetch.
pub const CONVERSATION_LIMIT: usize = 100;

/// Transport errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// A fetch or control request failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// A message send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The requested attachment does not exist.
    #[error("attachment not found: {0}")]
    AttachmentNotFound(i64),

    /// A tapback send failed.
    #[error("tapback failed: {0}")]
    TapbackFailed(String),

    /// The push stream could not be started.
    #[error("push stream failed: {0}")]
    StreamFailed(String),
}

/// Transport trait for talking to the remote message bridge.
///
/// Implementations handle the underlying connection mechanism (WebSocket,
/// mock, etc) including encryption; everything here is typed except push
/// events, which arrive as raw JSON for the router to decode.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect and authenticate against the bridge endpoint.
    async fn connect(&self, endpoint: &str, credentials: &str) -> Result<(), TransportError>;

    /// Fetch a page of conversations, most recent first.
    async fn fetch_conversations(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Conversation>, TransportError>;

    /// Fetch a page of a conversation's history, newest first.
    ///
    /// `offset` is the server-side cursor: how many messages to skip from
    /// the newest end.
    async fn fetch_messages(
        &self,
        conversation_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>, TransportError>;

    /// Send a message to the resolved recipient.
    ///
    /// The bridge may or may not return the confirmed message; callers must
    /// handle both.
    async fn send_message(
        &self,
        text: &str,
        recipient: &str,
        reply_to: Option<&MessageGuid>,
    ) -> Result<Option<Message>, TransportError>;

    /// Fetch the raw bytes of an attachment.
    async fn fetch_attachment(&self, id: i64) -> Result<Vec<u8>, TransportError>;

    /// Mark every message in a conversation as read.
    async fn mark_read(&self, conversation_id: &str) -> Result<(), TransportError>;

    /// Add or remove a tapback on a message.
    async fn send_tapback(
        &self,
        kind: TapbackKind,
        message_guid: &MessageGuid,
        action: TapbackAction,
    ) -> Result<(), TransportError>;

    /// Open the real-time push stream.
    ///
    /// The sink is registered once; the transport feeds every subsequent
    /// wire event through it until `stop_push_stream` or `close`.
    async fn start_push_stream(
        &self,
        events: mpsc::UnboundedSender<serde_json::Value>,
    ) -> Result<(), TransportError>;

    /// Stop the push stream. Safe to call when no stream is open.
    async fn stop_push_stream(&self);

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully.
    async fn close(&self) -> Result<(), TransportError>;
}
