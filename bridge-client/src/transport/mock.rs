//! Mock transport for testing.
//!
//! Allows queueing fetch pages and send confirmations, capturing outbound
//! calls for verification, and injecting push events into a registered sink.

use super::{Transport, TransportError};
use async_trait::async_trait;
use bridge_types::{Conversation, Message, MessageGuid, TapbackAction, TapbackKind};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A message send captured by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// The message body.
    pub text: String,
    /// The destination handed to the transport.
    pub recipient: String,
    /// Reply target, when set.
    pub reply_to: Option<MessageGuid>,
}

/// Mock transport for testing.
///
/// Clones share state, so tests can keep a handle while the client owns
/// another.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    connected_endpoint: Option<String>,
    conversation_pages: VecDeque<Vec<Conversation>>,
    message_pages: HashMap<String, VecDeque<Vec<Message>>>,
    send_confirmations: VecDeque<Option<Message>>,
    attachments: HashMap<i64, Vec<u8>>,
    push_sink: Option<mpsc::UnboundedSender<serde_json::Value>>,
    sent_messages: Vec<SentMessage>,
    conversation_fetches: Vec<(usize, usize)>,
    message_fetches: Vec<(String, usize, usize)>,
    marked_read: Vec<String>,
    sent_tapbacks: Vec<(TapbackKind, MessageGuid, TapbackAction)>,
    fail_next_connect: Option<String>,
    fail_next_conversations: Option<String>,
    fail_next_messages: Option<String>,
    fail_next_send: Option<String>,
    fail_next_mark_read: Option<String>,
    fail_next_tapback: Option<String>,
    fail_next_stream: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page for the next `fetch_conversations` call.
    pub fn queue_conversations(&self, page: Vec<Conversation>) {
        self.inner
            .lock()
            .unwrap()
            .conversation_pages
            .push_back(page);
    }

    /// Queue a page for the next `fetch_messages` call on a conversation.
    pub fn queue_messages(&self, conversation_id: &str, page: Vec<Message>) {
        self.inner
            .lock()
            .unwrap()
            .message_pages
            .entry(conversation_id.to_string())
            .or_default()
            .push_back(page);
    }

    /// Queue the result for the next `send_message` call.
    ///
    /// `Some` simulates a bridge that returns the confirmed message; `None`
    /// one that only acknowledges. Unqueued sends acknowledge.
    pub fn queue_send_confirmation(&self, confirmed: Option<Message>) {
        self.inner
            .lock()
            .unwrap()
            .send_confirmations
            .push_back(confirmed);
    }

    /// Make an attachment fetchable.
    pub fn insert_attachment(&self, id: i64, bytes: Vec<u8>) {
        self.inner.lock().unwrap().attachments.insert(id, bytes);
    }

    /// Deliver a raw push event through the registered sink.
    ///
    /// Returns false when no stream is open.
    pub fn push(&self, event: serde_json::Value) -> bool {
        let inner = self.inner.lock().unwrap();
        match &inner.push_sink {
            Some(sink) => sink.send(event).is_ok(),
            None => false,
        }
    }

    /// Cause the next `connect` to fail with the given error.
    pub fn fail_next_connect(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_connect = Some(error.to_string());
    }

    /// Cause the next `fetch_conversations` to fail.
    pub fn fail_next_conversations_fetch(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_conversations = Some(error.to_string());
    }

    /// Cause the next `fetch_messages` to fail.
    pub fn fail_next_messages_fetch(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_messages = Some(error.to_string());
    }

    /// Cause the next `send_message` to fail.
    pub fn fail_next_send(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_send = Some(error.to_string());
    }

    /// Cause the next `mark_read` to fail.
    pub fn fail_next_mark_read(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_mark_read = Some(error.to_string());
    }

    /// Cause the next `send_tapback` to fail.
    pub fn fail_next_tapback(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_tapback = Some(error.to_string());
    }

    /// Cause the next `start_push_stream` to fail.
    pub fn fail_next_stream(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_stream = Some(error.to_string());
    }

    /// The endpoint of the last successful connect.
    pub fn connected_endpoint(&self) -> Option<String> {
        self.inner.lock().unwrap().connected_endpoint.clone()
    }

    /// All captured sends, in order.
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.inner.lock().unwrap().sent_messages.clone()
    }

    /// All `(limit, offset)` pairs passed to `fetch_conversations`.
    pub fn conversation_fetches(&self) -> Vec<(usize, usize)> {
        self.inner.lock().unwrap().conversation_fetches.clone()
    }

    /// All `(conversation, limit, offset)` triples passed to `fetch_messages`.
    pub fn message_fetches(&self) -> Vec<(String, usize, usize)> {
        self.inner.lock().unwrap().message_fetches.clone()
    }

    /// Conversations passed to `mark_read`, in order.
    pub fn marked_read(&self) -> Vec<String> {
        self.inner.lock().unwrap().marked_read.clone()
    }

    /// Tapbacks passed to `send_tapback`, in order.
    pub fn sent_tapbacks(&self) -> Vec<(TapbackKind, MessageGuid, TapbackAction)> {
        self.inner.lock().unwrap().sent_tapbacks.clone()
    }

    /// Whether a push stream sink is currently registered.
    pub fn is_push_stream_open(&self) -> bool {
        self.inner.lock().unwrap().push_sink.is_some()
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, endpoint: &str, _credentials: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next_connect.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner.connected = true;
        inner.connected_endpoint = Some(endpoint.to_string());
        Ok(())
    }

    async fn fetch_conversations(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Conversation>, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        inner.conversation_fetches.push((limit, offset));
        if let Some(error) = inner.fail_next_conversations.take() {
            return Err(TransportError::RequestFailed(error));
        }

        Ok(inner.conversation_pages.pop_front().unwrap_or_default())
    }

    async fn fetch_messages(
        &self,
        conversation_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        inner
            .message_fetches
            .push((conversation_id.to_string(), limit, offset));
        if let Some(error) = inner.fail_next_messages.take() {
            return Err(TransportError::RequestFailed(error));
        }

        Ok(inner
            .message_pages
            .get_mut(conversation_id)
            .and_then(|pages| pages.pop_front())
            .unwrap_or_default())
    }

    async fn send_message(
        &self,
        text: &str,
        recipient: &str,
        reply_to: Option<&MessageGuid>,
    ) -> Result<Option<Message>, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_messages.push(SentMessage {
            text: text.to_string(),
            recipient: recipient.to_string(),
            reply_to: reply_to.cloned(),
        });
        Ok(inner.send_confirmations.pop_front().flatten())
    }

    async fn fetch_attachment(&self, id: i64) -> Result<Vec<u8>, TransportError> {
        let inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        inner
            .attachments
            .get(&id)
            .cloned()
            .ok_or(TransportError::AttachmentNotFound(id))
    }

    async fn mark_read(&self, conversation_id: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        if let Some(error) = inner.fail_next_mark_read.take() {
            return Err(TransportError::RequestFailed(error));
        }

        inner.marked_read.push(conversation_id.to_string());
        Ok(())
    }

    async fn send_tapback(
        &self,
        kind: TapbackKind,
        message_guid: &MessageGuid,
        action: TapbackAction,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        if let Some(error) = inner.fail_next_tapback.take() {
            return Err(TransportError::TapbackFailed(error));
        }

        inner
            .sent_tapbacks
            .push((kind, message_guid.clone(), action));
        Ok(())
    }

    async fn start_push_stream(
        &self,
        events: mpsc::UnboundedSender<serde_json::Value>,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        if let Some(error) = inner.fail_next_stream.take() {
            return Err(TransportError::StreamFailed(error));
        }

        inner.push_sink = Some(events);
        Ok(())
    }

    async fn stop_push_stream(&self) {
        self.inner.lock().unwrap().push_sink = None;
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
        inner.push_sink = None;
        Ok(())
    }
}
