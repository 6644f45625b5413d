//! Frame Transport Port - One bidirectional text channel to a client.
//!
//! The session handler owns its transport exclusively for the lifetime of
//! the session. The WebSocket adapter lives in `adapters::http::chat`;
//! tests drive sessions through in-memory implementations.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::chat::OutboundFrame;

/// What a single receive produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A complete text frame.
    Text(String),
    /// A binary frame. The protocol is text only.
    Binary,
    /// The peer closed the connection (close frame or end of stream).
    Closed,
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection already closed")]
    Closed,

    #[error("transport error: {0}")]
    Io(String),
}

#[async_trait]
pub trait FrameTransport: Send {
    /// Waits for the next inbound frame. Control frames (ping/pong) are
    /// handled inside the transport and never surface here.
    async fn recv(&mut self) -> Result<InboundEvent, TransportError>;

    /// Sends one outbound frame, returning once it has been written.
    async fn send(&mut self, frame: OutboundFrame) -> Result<(), TransportError>;

    /// Releases the connection. Idempotent: calling it after the peer has
    /// gone, or calling it twice, must neither fail nor block.
    async fn close(&mut self);
}
