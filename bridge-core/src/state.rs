//! Connection state machine for msgbridge.
//!
//! This module provides a pure, side-effect-free state machine for managing
//! connection lifecycle. The state machine takes events as input and produces
//! a new state plus a list of actions to execute.
//!
//! The actual I/O (connecting, fetching, opening the push stream) is
//! performed by bridge-client, not by this module. This enables instant unit
//! testing without network mocks.

/// Connection state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to the bridge.
    Disconnected,
    /// Connection attempt in progress.
    Connecting,
    /// Fully connected; initial fetch and push stream triggered.
    Connected,
}

impl ConnectionState {
    /// Create a new state machine in the Disconnected state.
    pub fn new() -> Self {
        Self::Disconnected
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (bridge-client)
    /// is responsible for executing the returned actions in order.
    pub fn on_event(self, event: Event) -> (Self, Vec<Action>) {
        match (self, event) {
            // From Disconnected
            (Self::Disconnected, Event::ConnectRequested) => {
                (Self::Connecting, vec![Action::Connect])
            }

            // From Connecting
            (Self::Connecting, Event::ConnectSucceeded) => (
                Self::Connected,
                vec![Action::FetchConversations, Action::OpenPushStream],
            ),
            (Self::Connecting, Event::ConnectFailed { error }) => (
                Self::Disconnected,
                // No dependent fetch or stream start after a failed connect
                vec![Action::EmitEvent(SessionEvent::ConnectionFailed { error })],
            ),

            // Teardown from any live state
            (Self::Connected | Self::Connecting, Event::DisconnectRequested) => (
                Self::Disconnected,
                vec![
                    Action::TearDown,
                    Action::ClearState,
                    Action::EmitEvent(SessionEvent::Disconnected),
                ],
            ),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if currently connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if a connection attempt is in progress.
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that can occur in the connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// User requested connection.
    ConnectRequested,
    /// Transport connection succeeded.
    ConnectSucceeded,
    /// Transport connection failed.
    ConnectFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// User requested disconnect.
    DisconnectRequested,
}

/// Actions to be executed by bridge-client.
///
/// These are instructions, not side effects. The client interprets these and
/// performs the actual I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Initiate the transport connection.
    Connect,
    /// Run the initial bulk conversation fetch.
    FetchConversations,
    /// Open the real-time push stream.
    OpenPushStream,
    /// Stop the push stream and close the transport.
    TearDown,
    /// Clear every store and the selected-conversation pointer, and bump
    /// the session generation so stale completions are discarded.
    ClearState,
    /// Surface an event to the application.
    EmitEvent(SessionEvent),
}

/// Session-level events surfaced to the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The connect sequence failed; no partial state was retained.
    ConnectionFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// The session ended and all local state was cleared.
    Disconnected,
}
