//! BridgeClient - the main interface for msgbridge.
//!
//! This module provides [`BridgeClient`], the primary API for applications
//! to hold a live local view of a remote message-bridge service.
//!
//! # Architecture
//!
//! All mutable state (message logs, conversation ordering, pagination,
//! warnings, the selected conversation) is owned by one session worker task.
//! Public methods enqueue commands; spawned network completions re-enter the
//! worker the same way, stamped with the session generation current at
//! dispatch. The worker discards completions from an older generation, so a
//! response arriving after a disconnect can never resurrect cleared state.
//!
//! ```text
//! Application → BridgeClient → command channel → session worker
//!                                                     ↓
//!                                    bridge-core (pure stores, no I/O)
//! ```

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use bridge_core::{
    route, Action, ConnectionState, ConversationList, Event, MessageLog, PageState, PageTracker,
    RouterOutcome, SessionEvent, SyncWarnings,
};
use bridge_types::{Conversation, Message, MessageGuid, MessageId, TapbackAction, TapbackKind};

use crate::notify::Notifier;
use crate::transport::{Transport, TransportError, CONVERSATION_LIMIT, PAGE_SIZE};

/// Client errors.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Not connected to the bridge.
    #[error("not connected")]
    NotConnected,

    /// The conversation id is not in the local view.
    #[error("unknown conversation: {0}")]
    UnknownConversation(String),

    /// The conversation has no participants and no group id to send to.
    #[error("conversation has no participants and no group id")]
    InvalidRecipient,

    /// The session worker is gone.
    #[error("session terminated")]
    Terminated,
}

/// Configuration for BridgeClient.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Bridge endpoint to connect to.
    pub endpoint: String,
    /// Credentials handed to the transport on connect.
    pub credentials: String,
    /// Messages per history page.
    pub page_size: usize,
    /// Upper bound for the initial conversation fetch.
    pub conversation_limit: usize,
}

impl BridgeConfig {
    /// Create a configuration with the default page sizes.
    pub fn new(endpoint: &str, credentials: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            credentials: credentials.to_string(),
            page_size: PAGE_SIZE,
            conversation_limit: CONVERSATION_LIMIT,
        }
    }

    /// Set the history page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the initial conversation fetch bound.
    pub fn with_conversation_limit(mut self, limit: usize) -> Self {
        self.conversation_limit = limit;
        self
    }
}

/// Events surfaced to the embedding application.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The conversation list (content or order) changed.
    ConversationsChanged,
    /// A conversation's message list changed.
    MessagesChanged {
        /// The affected conversation.
        conversation_id: String,
    },
    /// A tapback arrived; no store changed, the UI decides what to redraw.
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
    /// A conversation's sync warning was set or cleared.
    SyncWarningsChanged {
        /// The affected conversation.
        conversation_id: String,
    },
    /// The connect sequence failed; no partial state was retained.
    ConnectionFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// The session ended and all local state was cleared.
    Disconnected,
}

/// Commands processed by the session worker, including re-entrant network
/// completions (stamped with the generation current at dispatch).
enum Command {
    Connect {
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    IsConnected {
        reply: oneshot::Sender<bool>,
    },
    Conversations {
        reply: oneshot::Sender<Vec<Conversation>>,
    },
    Messages {
        conversation_id: String,
        reply: oneshot::Sender<Vec<Message>>,
    },
    SelectConversation {
        conversation_id: Option<String>,
        reply: oneshot::Sender<()>,
    },
    SelectedConversation {
        reply: oneshot::Sender<Option<String>>,
    },
    LoadOlder {
        conversation_id: String,
        reply: oneshot::Sender<bool>,
    },
    SendText {
        conversation_id: String,
        text: String,
        reply_to: Option<MessageGuid>,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    SendTapback {
        kind: TapbackKind,
        message_guid: MessageGuid,
        action: TapbackAction,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    FetchAttachment {
        id: i64,
        reply: oneshot::Sender<Result<Vec<u8>, ClientError>>,
    },
    SyncWarning {
        conversation_id: String,
        reply: oneshot::Sender<Option<String>>,
    },
    Pagination {
        conversation_id: String,
        reply: oneshot::Sender<PageState>,
    },
    LastSendError {
        reply: oneshot::Sender<Option<String>>,
    },
    ClearSendError {
        reply: oneshot::Sender<()>,
    },
    PushRaw {
        generation: u64,
        value: serde_json::Value,
    },
    PageLoaded {
        generation: u64,
        conversation_id: String,
        result: Result<Vec<Message>, TransportError>,
    },
    SendFinished {
        generation: u64,
        conversation_id: String,
        placeholder: MessageGuid,
        result: Result<Option<Message>, TransportError>,
    },
    MarkReadFinished {
        generation: u64,
        conversation_id: String,
        result: Result<(), TransportError>,
    },
}

/// The main bridge client handle.
///
/// Cheap to clone; all clones talk to the same session worker.
#[derive(Clone)]
pub struct BridgeClient {
    commands: mpsc::UnboundedSender<Command>,
}

impl BridgeClient {
    /// Create a client and spawn its session worker.
    ///
    /// Returns the handle and the event stream the application consumes.
    pub fn new<T, N>(
        config: BridgeConfig,
        transport: T,
        notifier: N,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>)
    where
        T: Transport + 'static,
        N: Notifier + 'static,
    {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (events, event_rx) = mpsc::unbounded_channel();

        let worker = SessionWorker {
            config,
            transport: Arc::new(transport),
            notifier: Arc::new(notifier),
            commands: commands.clone(),
            events,
            state: ConnectionState::new(),
            generation: 0,
            notifications_allowed: false,
            messages: MessageLog::new(),
            conversations: ConversationList::new(),
            pagination: PageTracker::new(),
            warnings: SyncWarnings::new(),
            selected: None,
            last_send_error: None,
        };
        tokio::spawn(worker.run(command_rx));

        (Self { commands }, event_rx)
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> Command,
    ) -> Result<R, ClientError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .map_err(|_| ClientError::Terminated)?;
        response.await.map_err(|_| ClientError::Terminated)
    }

    /// Connect, run the initial conversation fetch, and open the push stream.
    ///
    /// A no-op when already connected. On failure the session is left
    /// disconnected with no partial state.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.request(|reply| Command::Connect { reply }).await?
    }

    /// Tear down the transport and clear every store.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.request(|reply| Command::Disconnect { reply }).await
    }

    /// Disconnect, then connect again with the same credentials.
    pub async fn reconnect(&self) -> Result<(), ClientError> {
        self.disconnect().await?;
        self.connect().await
    }

    /// Whether the session is connected.
    pub async fn is_connected(&self) -> bool {
        self.request(|reply| Command::IsConnected { reply })
            .await
            .unwrap_or(false)
    }

    /// The ordered conversation list (pinned first, then by recency).
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ClientError> {
        self.request(|reply| Command::Conversations { reply }).await
    }

    /// A conversation's messages, newest first.
    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<Message>, ClientError> {
        self.request(|reply| Command::Messages {
            conversation_id: conversation_id.to_string(),
            reply,
        })
        .await
    }

    /// Select (or deselect with `None`) the conversation the user is viewing.
    ///
    /// Selecting clears its delivered notifications, marks it read on the
    /// bridge, and loads its first history page if none is held yet.
    pub async fn select_conversation(
        &self,
        conversation_id: Option<&str>,
    ) -> Result<(), ClientError> {
        self.request(|reply| Command::SelectConversation {
            conversation_id: conversation_id.map(str::to_string),
            reply,
        })
        .await
    }

    /// The currently selected conversation.
    pub async fn selected_conversation(&self) -> Result<Option<String>, ClientError> {
        self.request(|reply| Command::SelectedConversation { reply })
            .await
    }

    /// Request one more page of history for a conversation.
    ///
    /// Returns false — without touching the transport — when history is
    /// exhausted, a page fetch is already in flight, or the session is
    /// disconnected.
    pub async fn load_older_messages(&self, conversation_id: &str) -> Result<bool, ClientError> {
        self.request(|reply| Command::LoadOlder {
            conversation_id: conversation_id.to_string(),
            reply,
        })
        .await
    }

    /// Send a text message optimistically.
    ///
    /// Returns once the placeholder is in the local view; the outcome of the
    /// network send is reconciled later (confirmed message replaces the
    /// placeholder, failure removes it and fills the last-send-error slot).
    pub async fn send_text(
        &self,
        conversation_id: &str,
        text: &str,
        reply_to: Option<MessageGuid>,
    ) -> Result<(), ClientError> {
        self.request(|reply| Command::SendText {
            conversation_id: conversation_id.to_string(),
            text: text.to_string(),
            reply_to,
            reply,
        })
        .await?
    }

    /// Add or remove a tapback on a message.
    pub async fn send_tapback(
        &self,
        kind: TapbackKind,
        message_guid: MessageGuid,
        action: TapbackAction,
    ) -> Result<(), ClientError> {
        self.request(|reply| Command::SendTapback {
            kind,
            message_guid,
            action,
            reply,
        })
        .await?
    }

    /// Fetch the raw bytes of an attachment.
    pub async fn fetch_attachment(&self, id: i64) -> Result<Vec<u8>, ClientError> {
        self.request(|reply| Command::FetchAttachment { id, reply })
            .await?
    }

    /// The advisory warning for a conversation, if any.
    pub async fn sync_warning(&self, conversation_id: &str) -> Result<Option<String>, ClientError> {
        self.request(|reply| Command::SyncWarning {
            conversation_id: conversation_id.to_string(),
            reply,
        })
        .await
    }

    /// A conversation's pagination state.
    pub async fn pagination(&self, conversation_id: &str) -> Result<PageState, ClientError> {
        self.request(|reply| Command::Pagination {
            conversation_id: conversation_id.to_string(),
            reply,
        })
        .await
    }

    /// The most recent send failure, if any.
    pub async fn last_send_error(&self) -> Result<Option<String>, ClientError> {
        self.request(|reply| Command::LastSendError { reply }).await
    }

    /// Clear the last-send-error slot.
    pub async fn clear_send_error(&self) -> Result<(), ClientError> {
        self.request(|reply| Command::ClearSendError { reply })
            .await
    }
}

/// The session worker: sole owner of all mutable sync state.
struct SessionWorker<T, N> {
    config: BridgeConfig,
    transport: Arc<T>,
    notifier: Arc<N>,
    /// Handle for spawned completions to re-enter the worker.
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedSender<ClientEvent>,
    state: ConnectionState,
    /// Bumped on every teardown; completions from older generations are
    /// discarded.
    generation: u64,
    notifications_allowed: bool,
    messages: MessageLog,
    conversations: ConversationList,
    pagination: PageTracker,
    warnings: SyncWarnings,
    selected: Option<String>,
    last_send_error: Option<String>,
}

impl<T, N> SessionWorker<T, N>
where
    T: Transport + 'static,
    N: Notifier + 'static,
{
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.handle(command).await;
        }
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Connect { reply } => {
                let result = self.handle_connect().await;
                let _ = reply.send(result);
            }
            Command::Disconnect { reply } => {
                let (state, actions) = self.state.on_event(Event::DisconnectRequested);
                self.state = state;
                self.execute(actions).await;
                let _ = reply.send(());
            }
            Command::IsConnected { reply } => {
                let _ = reply.send(self.state.is_connected());
            }
            Command::Conversations { reply } => {
                let _ = reply.send(self.conversations.conversations().to_vec());
            }
            Command::Messages {
                conversation_id,
                reply,
            } => {
                let _ = reply.send(self.messages.messages(&conversation_id).to_vec());
            }
            Command::SelectConversation {
                conversation_id,
                reply,
            } => {
                self.handle_select(conversation_id);
                let _ = reply.send(());
            }
            Command::SelectedConversation { reply } => {
                let _ = reply.send(self.selected.clone());
            }
            Command::LoadOlder {
                conversation_id,
                reply,
            } => {
                let started =
                    self.state.is_connected() && self.pagination.begin_load(&conversation_id);
                if started {
                    self.spawn_page_fetch(&conversation_id);
                }
                let _ = reply.send(started);
            }
            Command::SendText {
                conversation_id,
                text,
                reply_to,
                reply,
            } => {
                let result = self.begin_send(conversation_id, text, reply_to);
                let _ = reply.send(result);
            }
            Command::SendTapback {
                kind,
                message_guid,
                action,
                reply,
            } => {
                let result = if self.state.is_connected() {
                    self.transport
                        .send_tapback(kind, &message_guid, action)
                        .await
                        .map_err(ClientError::Transport)
                } else {
                    Err(ClientError::NotConnected)
                };
                let _ = reply.send(result);
            }
            Command::FetchAttachment { id, reply } => {
                let result = if self.state.is_connected() {
                    self.transport
                        .fetch_attachment(id)
                        .await
                        .map_err(ClientError::Transport)
                } else {
                    Err(ClientError::NotConnected)
                };
                let _ = reply.send(result);
            }
            Command::SyncWarning {
                conversation_id,
                reply,
            } => {
                let _ = reply.send(self.warnings.get(&conversation_id).map(str::to_string));
            }
            Command::Pagination {
                conversation_id,
                reply,
            } => {
                let _ = reply.send(self.pagination.state(&conversation_id));
            }
            Command::LastSendError { reply } => {
                let _ = reply.send(self.last_send_error.clone());
            }
            Command::ClearSendError { reply } => {
                self.last_send_error = None;
                let _ = reply.send(());
            }
            Command::PushRaw { generation, value } => {
                if generation != self.generation {
                    debug!("discarding stale push event");
                } else {
                    self.handle_push(value).await;
                }
            }
            Command::PageLoaded {
                generation,
                conversation_id,
                result,
            } => {
                if generation != self.generation {
                    debug!(conversation = %conversation_id, "discarding stale page load");
                } else {
                    self.finish_page_load(conversation_id, result);
                }
            }
            Command::SendFinished {
                generation,
                conversation_id,
                placeholder,
                result,
            } => {
                if generation != self.generation {
                    debug!(conversation = %conversation_id, "discarding stale send completion");
                } else {
                    self.finish_send(conversation_id, placeholder, result);
                }
            }
            Command::MarkReadFinished {
                generation,
                conversation_id,
                result,
            } => {
                if generation != self.generation {
                    debug!(conversation = %conversation_id, "discarding stale mark-read result");
                } else if let Err(error) = result {
                    warn!(conversation = %conversation_id, %error, "mark read failed");
                    self.warnings
                        .set(&conversation_id, "read receipt could not sync");
                    self.emit(ClientEvent::SyncWarningsChanged { conversation_id });
                }
            }
        }
    }

    async fn handle_connect(&mut self) -> Result<(), ClientError> {
        let (state, actions) = self.state.on_event(Event::ConnectRequested);
        self.state = state;
        if !actions.contains(&Action::Connect) {
            // Already live; connect() is idempotent
            return Ok(());
        }

        match self
            .transport
            .connect(&self.config.endpoint, &self.config.credentials)
            .await
        {
            Ok(()) => {
                let (state, actions) = self.state.on_event(Event::ConnectSucceeded);
                self.state = state;
                self.execute(actions).await;
                Ok(())
            }
            Err(error) => {
                let (state, actions) = self.state.on_event(Event::ConnectFailed {
                    error: error.to_string(),
                });
                self.state = state;
                self.execute(actions).await;
                Err(ClientError::Transport(error))
            }
        }
    }

    /// Execute the actions produced by the connection state machine.
    async fn execute(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Connect => {
                    // Driven inline by handle_connect
                }
                Action::FetchConversations => {
                    match self
                        .transport
                        .fetch_conversations(self.config.conversation_limit, 0)
                        .await
                    {
                        Ok(conversations) => {
                            self.conversations.replace_all(conversations);
                            self.emit(ClientEvent::ConversationsChanged);
                        }
                        Err(error) => {
                            warn!(%error, "initial conversation fetch failed");
                        }
                    }
                }
                Action::OpenPushStream => {
                    let (sink, mut raw_events) = mpsc::unbounded_channel();
                    match self.transport.start_push_stream(sink).await {
                        Ok(()) => {
                            self.notifications_allowed =
                                self.notifier.request_authorization().await;
                            let commands = self.commands.clone();
                            let generation = self.generation;
                            tokio::spawn(async move {
                                while let Some(value) = raw_events.recv().await {
                                    if commands
                                        .send(Command::PushRaw { generation, value })
                                        .is_err()
                                    {
                                        break;
                                    }
                                }
                            });
                        }
                        Err(error) => {
                            warn!(%error, "push stream could not be started");
                        }
                    }
                }
                Action::TearDown => {
                    self.transport.stop_push_stream().await;
                    if let Err(error) = self.transport.close().await {
                        warn!(%error, "transport close failed");
                    }
                }
                Action::ClearState => {
                    self.generation += 1;
                    self.messages.clear();
                    self.conversations.clear();
                    self.pagination.clear();
                    self.warnings.clear_all();
                    self.selected = None;
                }
                Action::EmitEvent(event) => {
                    let event = match event {
                        SessionEvent::ConnectionFailed { error } => {
                            ClientEvent::ConnectionFailed { error }
                        }
                        SessionEvent::Disconnected => ClientEvent::Disconnected,
                    };
                    self.emit(event);
                }
            }
        }
    }

    fn handle_select(&mut self, conversation_id: Option<String>) {
        self.selected = conversation_id.clone();
        let Some(id) = conversation_id else {
            return;
        };
        self.notifier.clear(&id);
        if !self.state.is_connected() {
            return;
        }
        self.spawn_mark_read(&id);
        if self.messages.messages(&id).is_empty() && self.pagination.begin_load(&id) {
            self.spawn_page_fetch(&id);
        }
    }

    fn begin_send(
        &mut self,
        conversation_id: String,
        text: String,
        reply_to: Option<MessageGuid>,
    ) -> Result<(), ClientError> {
        if !self.state.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let conversation = self
            .conversations
            .get(&conversation_id)
            .ok_or_else(|| ClientError::UnknownConversation(conversation_id.clone()))?;
        let recipient = conversation.recipient().ok_or(ClientError::InvalidRecipient)?;

        let placeholder = Message {
            id: MessageId::placeholder(),
            guid: MessageGuid::local(),
            text: Some(text.clone()),
            date: now_millis(),
            is_from_me: true,
            handle_id: None,
            conversation_id: conversation_id.clone(),
            attachments: Vec::new(),
            reply_to_guid: reply_to.clone(),
            thread_originator_guid: None,
        };
        self.messages
            .insert_newest(&conversation_id, placeholder.clone());
        self.conversations.record_message(&placeholder);
        self.emit(ClientEvent::MessagesChanged {
            conversation_id: conversation_id.clone(),
        });
        self.emit(ClientEvent::ConversationsChanged);

        let transport = Arc::clone(&self.transport);
        let commands = self.commands.clone();
        let generation = self.generation;
        let guid = placeholder.guid;
        tokio::spawn(async move {
            let result = transport
                .send_message(&text, recipient.as_str(), reply_to.as_ref())
                .await;
            let _ = commands.send(Command::SendFinished {
                generation,
                conversation_id,
                placeholder: guid,
                result,
            });
        });
        Ok(())
    }

    fn finish_send(
        &mut self,
        conversation_id: String,
        placeholder: MessageGuid,
        result: Result<Option<Message>, TransportError>,
    ) {
        match result {
            Ok(Some(confirmed)) => {
                if confirmed.guid == placeholder {
                    self.messages
                        .insert_newest(&conversation_id, confirmed.clone());
                } else if !self.messages.replace_by_guid(
                    &conversation_id,
                    &placeholder,
                    confirmed.clone(),
                ) {
                    self.messages
                        .insert_newest(&conversation_id, confirmed.clone());
                }
                self.conversations.record_message(&confirmed);
                self.emit(ClientEvent::MessagesChanged {
                    conversation_id: conversation_id.clone(),
                });
                self.emit(ClientEvent::ConversationsChanged);
            }
            Ok(None) => {
                // The bridge only acknowledged; the placeholder stays until
                // the push stream echoes the confirmed message (same guid)
            }
            Err(error) => {
                warn!(conversation = %conversation_id, %error, "send failed, rolling back");
                self.messages.remove_by_guid(&conversation_id, &placeholder);
                self.last_send_error = Some(error.to_string());
                self.emit(ClientEvent::MessagesChanged { conversation_id });
            }
        }
    }

    fn finish_page_load(
        &mut self,
        conversation_id: String,
        result: Result<Vec<Message>, TransportError>,
    ) {
        match result {
            Ok(page) => {
                let fetched = page.len();
                if self.pagination.state(&conversation_id).offset == 0 {
                    self.messages.replace_all(&conversation_id, page);
                } else {
                    self.messages.append_older(&conversation_id, page);
                }
                self.pagination
                    .complete_load(&conversation_id, fetched, self.config.page_size);
                self.emit(ClientEvent::MessagesChanged { conversation_id });
            }
            Err(error) => {
                warn!(conversation = %conversation_id, %error, "history page fetch failed");
                self.pagination.fail_load(&conversation_id);
            }
        }
    }

    async fn handle_push(&mut self, value: serde_json::Value) {
        let outcome = route(
            value,
            self.selected.as_deref(),
            &mut self.messages,
            &mut self.conversations,
            &mut self.warnings,
        );
        match outcome {
            RouterOutcome::MessageStored {
                conversation_id,
                notify,
            } => {
                self.emit(ClientEvent::MessagesChanged {
                    conversation_id: conversation_id.clone(),
                });
                self.emit(ClientEvent::ConversationsChanged);
                if let Some(request) = notify {
                    if self.notifications_allowed {
                        let sender = request
                            .sender_name
                            .clone()
                            .or_else(|| request.message.handle_id.clone())
                            .unwrap_or_else(|| "Unknown sender".to_string());
                        if let Err(error) = self.notifier.show(&request.message, &sender).await {
                            warn!(%error, "notification failed");
                        }
                    }
                }
            }
            RouterOutcome::Tapback {
                kind,
                action,
                message_guid,
                conversation_id,
            } => {
                self.emit(ClientEvent::Tapback {
                    kind,
                    action,
                    message_guid,
                    conversation_id,
                });
            }
            RouterOutcome::WarningSet { conversation_id }
            | RouterOutcome::WarningCleared { conversation_id } => {
                self.emit(ClientEvent::SyncWarningsChanged { conversation_id });
            }
            RouterOutcome::PinsApplied => {
                self.emit(ClientEvent::ConversationsChanged);
            }
            RouterOutcome::Dropped { error } => {
                warn!(%error, "dropping malformed push event");
            }
        }
    }

    fn spawn_page_fetch(&self, conversation_id: &str) {
        let transport = Arc::clone(&self.transport);
        let commands = self.commands.clone();
        let generation = self.generation;
        let conversation_id = conversation_id.to_string();
        let limit = self.config.page_size;
        let offset = self.pagination.state(&conversation_id).offset;
        tokio::spawn(async move {
            let result = transport.fetch_messages(&conversation_id, limit, offset).await;
            let _ = commands.send(Command::PageLoaded {
                generation,
                conversation_id,
                result,
            });
        });
    }

    fn spawn_mark_read(&self, conversation_id: &str) {
        let transport = Arc::clone(&self.transport);
        let commands = self.commands.clone();
        let generation = self.generation;
        let conversation_id = conversation_id.to_string();
        tokio::spawn(async move {
            let result = transport.mark_read(&conversation_id).await;
            let _ = commands.send(Command::MarkReadFinished {
                generation,
                conversation_id,
                result,
            });
        });
    }

    fn emit(&self, event: ClientEvent) {
        // The application may have dropped the receiver; that is fine
        let _ = self.events.send(event);
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
