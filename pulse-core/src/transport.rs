//! Transport contract for the server push stream
//!
//! One `open()` call is one physical connection attempt; the returned stream
//! yields named events until the connection drops. Reconnection is the
//! supervisor's job, not the transport's.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Reserved event name the server emits once per (re)connect. Receipt of it
/// is the only signal that a connection is genuinely established.
pub const INIT_EVENT: &str = "init";

/// A named event received from the push stream.
///
/// The payload is carried verbatim and never interpreted here; invalidation
/// is keyed on the name alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl StreamEvent {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }
}

/// Errors from the push-stream transport. All of them are recovered by
/// reconnecting; none are surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {reason}")]
    Connect { reason: String },

    #[error("stream error: {reason}")]
    Stream { reason: String },

    #[error("stream ended unexpectedly")]
    UnexpectedEnd,
}

/// Stream of events from one connection, ending when the connection drops.
pub type EventStream = BoxStream<'static, Result<StreamEvent, TransportError>>;

/// Opens push-stream connections.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Attempt one connection. Dropping the returned stream closes it.
    async fn open(&self) -> Result<EventStream, TransportError>;
}
