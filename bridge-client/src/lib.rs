//! # bridge-client
//!
//! Client session engine for the msgbridge sync protocol.
//!
//! This is the crate applications embed to hold a live, consistent local view
//! of a remote message-bridge service.
//!
//! ## Architecture
//!
//! All mutable state lives inside a single worker task; public
//! [`BridgeClient`] methods enqueue commands into it, and spawned network
//! completions re-enter it the same way, so every mutation happens in one
//! total order.
//!
//! ```text
//! Application → BridgeClient → command channel → session worker
//!                                                     ↓
//!                                    bridge-core (pure stores, no I/O)
//!                                                     ↓
//!                                        Transport / Notifier traits
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use msgbridge_client::{BridgeClient, BridgeConfig, MockTransport, NoopNotifier};
//!
//! let config = BridgeConfig::new("wss://bridge.local", "password");
//! let (client, mut events) = BridgeClient::new(config, MockTransport::new(), NoopNotifier);
//!
//! client.connect().await?;
//! client.send_text("chat-1", "Hello!", None).await?;
//! let messages = client.messages("chat-1").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod notify;
pub mod transport;

pub use bridge_core::PageState;
pub use client::{BridgeClient, BridgeConfig, ClientError, ClientEvent};
pub use notify::{MockNotifier, NoopNotifier, Notifier, NotifyError};
pub use transport::{
    MockTransport, SentMessage, Transport, TransportError, CONVERSATION_LIMIT, PAGE_SIZE,
};
