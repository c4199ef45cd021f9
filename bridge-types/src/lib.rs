//! # bridge-types
//!
//! Domain model for the msgbridge sync engine.
//!
//! This crate provides the foundational types used across all msgbridge
//! crates:
//! - [`MessageGuid`], [`MessageId`] - Message identity (guid is the merge key)
//! - [`Conversation`], [`Handle`], [`Message`], [`Attachment`] - Domain model
//! - [`PushEvent`] - Typed decoding of the bridge's real-time wire events
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod models;

pub use error::WireError;
pub use ids::{MessageGuid, MessageId};
pub use models::{
    Attachment, Conversation, Handle, Message, PinAssignment, PushEvent, Recipient, TapbackAction,
    TapbackKind,
};
