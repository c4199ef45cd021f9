//! Local notification abstraction for msgbridge.
//!
//! Presentation is an external collaborator; the session only decides *when*
//! a notification is warranted (inbound message, not the selected
//! conversation) and hands it over through this trait.

use async_trait::async_trait;
use bridge_types::Message;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Notification errors.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// The platform refused or failed to present the notification.
    #[error("notification failed: {0}")]
    Failed(String),
}

/// Local notification presenter.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ask the platform for permission to notify. Called once per session.
    async fn request_authorization(&self) -> bool;

    /// Present a notification for an inbound message.
    async fn show(&self, message: &Message, sender_name: &str) -> Result<(), NotifyError>;

    /// Dismiss any delivered notifications for a conversation.
    fn clear(&self, conversation_id: &str);
}

/// A notifier that silently drops everything.
///
/// For embedders that surface messages through their own UI only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn request_authorization(&self) -> bool {
        false
    }

    async fn show(&self, _message: &Message, _sender_name: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    fn clear(&self, _conversation_id: &str) {}
}

/// A notification captured by [`MockNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownNotification {
    /// The conversation the message belongs to.
    pub conversation_id: String,
    /// The sender name the session resolved.
    pub sender_name: String,
    /// The message body, when present.
    pub text: Option<String>,
}

/// Mock notifier for testing. Clones share state.
#[derive(Debug, Default)]
pub struct MockNotifier {
    inner: Arc<Mutex<MockNotifierInner>>,
}

#[derive(Debug)]
struct MockNotifierInner {
    authorized: bool,
    shown: Vec<ShownNotification>,
    cleared: Vec<String>,
}

impl Default for MockNotifierInner {
    fn default() -> Self {
        Self {
            authorized: true,
            shown: Vec::new(),
            cleared: Vec::new(),
        }
    }
}

impl MockNotifier {
    /// Create a mock notifier that grants authorization.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `request_authorization` return false.
    pub fn deny_authorization(&self) {
        self.inner.lock().unwrap().authorized = false;
    }

    /// All presented notifications, in order.
    pub fn shown(&self) -> Vec<ShownNotification> {
        self.inner.lock().unwrap().shown.clone()
    }

    /// All cleared conversation ids, in order.
    pub fn cleared(&self) -> Vec<String> {
        self.inner.lock().unwrap().cleared.clone()
    }
}

impl Clone for MockNotifier {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn request_authorization(&self) -> bool {
        self.inner.lock().unwrap().authorized
    }

    async fn show(&self, message: &Message, sender_name: &str) -> Result<(), NotifyError> {
        self.inner.lock().unwrap().shown.push(ShownNotification {
            conversation_id: message.conversation_id.clone(),
            sender_name: sender_name.to_string(),
            text: message.text.clone(),
        });
        Ok(())
    }

    fn clear(&self, conversation_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .cleared
            .push(conversation_id.to_string());
    }
}
