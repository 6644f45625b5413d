//! Chat session handler.
//!
//! Owns one client connection end to end: accepts it, holds one chat
//! context, decodes inbound frames, dispatches utterances to the model, and
//! releases the transport on every exit path.
//!
//! # Turn Flow
//! 1. Wait for the next inbound frame (or closure)
//! 2. Frames without the `You: ` marker get the protocol-error reply
//! 3. `You: exit` gets the goodbye frame and ends the session
//! 4. Anything else goes to the model; the whole reply is sent as one frame
//! 5. A failed model call is reported with one frame and the session goes on
//!
//! Exactly one turn is in flight per session: the next frame is not read
//! until the previous reply has been written.

use std::sync::Arc;

use crate::domain::chat::{FrameError, InboundFrame, OutboundFrame};
use crate::domain::foundation::{SessionId, SessionStatus, StateMachine};
use crate::ports::{ChatContext, ChatModel, FrameTransport, InboundEvent, Message, TransportError};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The client sent `You: exit`.
    ClientExit,
    /// The peer closed the connection while we waited for a frame.
    PeerDisconnected,
    /// Reading or writing a frame failed.
    TransportFailed,
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub outcome: SessionOutcome,
    pub final_status: SessionStatus,
    /// Completed model turns.
    pub turns: u32,
    /// Frames answered with the protocol-error reply.
    pub protocol_errors: u32,
    /// Model calls that failed and were reported to the client.
    pub upstream_failures: u32,
}

/// State of one active connection. Never shared between connections.
pub struct Session<T> {
    id: SessionId,
    status: SessionStatus,
    transport: T,
    context: Box<dyn ChatContext>,
    turns: u32,
    protocol_errors: u32,
    upstream_failures: u32,
}

impl<T: FrameTransport> Session<T> {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Conversation so far, as held by the chat context.
    pub fn history(&self) -> &[Message] {
        self.context.history()
    }

    fn advance(&mut self, target: SessionStatus) {
        match self.status.transition_to(target) {
            Ok(status) => self.status = status,
            Err(e) => tracing::error!(session_id = %self.id, error = %e, "Rejected session transition"),
        }
    }

    async fn send(&mut self, frame: OutboundFrame) -> Result<(), TransportError> {
        self.transport.send(frame).await
    }

    /// Closes the transport and walks the lifecycle to `Closed`.
    async fn teardown(&mut self) {
        self.advance(SessionStatus::Closing);
        self.transport.close().await;
        self.advance(SessionStatus::Closed);
    }
}

/// What the loop does after handling one frame.
enum Flow {
    Continue,
    Exit,
}

/// Drives chat sessions against a shared, read-only chat model.
#[derive(Clone)]
pub struct ChatSessionHandler {
    model: Arc<dyn ChatModel>,
}

impl ChatSessionHandler {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Establishes a session over a freshly handshaken transport.
    pub fn accept<T: FrameTransport>(&self, transport: T) -> Session<T> {
        let id = SessionId::new();
        let mut session = Session {
            id,
            status: SessionStatus::Connecting,
            transport,
            context: self.model.start_chat(id),
            turns: 0,
            protocol_errors: 0,
            upstream_failures: 0,
        };
        session.advance(SessionStatus::Active);

        tracing::info!(session_id = %id, "Chat session started");
        session
    }

    /// Accepts and runs a session to completion.
    pub async fn serve<T: FrameTransport>(&self, transport: T) -> SessionSummary {
        let session = self.accept(transport);
        self.run(session).await
    }

    /// Runs the frame loop until exit, disconnect, or transport failure.
    /// The transport is always closed before this returns.
    pub async fn run<T: FrameTransport>(&self, mut session: Session<T>) -> SessionSummary {
        let outcome = loop {
            let decoded = match session.transport.recv().await {
                Ok(InboundEvent::Text(text)) => InboundFrame::parse(&text),
                Ok(InboundEvent::Binary) => Err(FrameError::NotText),
                Ok(InboundEvent::Closed) => {
                    tracing::info!(session_id = %session.id, "Client disconnected");
                    break SessionOutcome::PeerDisconnected;
                }
                Err(e) => {
                    tracing::debug!(session_id = %session.id, error = %e, "Receive failed");
                    break SessionOutcome::TransportFailed;
                }
            };

            match Self::handle_frame(&mut session, decoded).await {
                Ok(Flow::Continue) => session.advance(SessionStatus::Active),
                Ok(Flow::Exit) => break SessionOutcome::ClientExit,
                Err(e) => {
                    tracing::debug!(session_id = %session.id, error = %e, "Send failed");
                    break SessionOutcome::TransportFailed;
                }
            }
        };

        session.teardown().await;

        let summary = SessionSummary {
            session_id: session.id,
            outcome,
            final_status: session.status,
            turns: session.turns,
            protocol_errors: session.protocol_errors,
            upstream_failures: session.upstream_failures,
        };
        tracing::info!(
            session_id = %summary.session_id,
            outcome = ?summary.outcome,
            turns = summary.turns,
            protocol_errors = summary.protocol_errors,
            upstream_failures = summary.upstream_failures,
            "Chat session closed"
        );
        summary
    }

    async fn handle_frame<T: FrameTransport>(
        session: &mut Session<T>,
        decoded: Result<InboundFrame, FrameError>,
    ) -> Result<Flow, TransportError> {
        let utterance = match decoded {
            Ok(InboundFrame::Utterance(text)) => text,
            Ok(InboundFrame::Exit) => {
                tracing::debug!(session_id = %session.id, "Client requested exit");
                session.send(OutboundFrame::goodbye()).await?;
                return Ok(Flow::Exit);
            }
            Err(e) => {
                tracing::debug!(session_id = %session.id, error = %e, "Rejected frame");
                session.protocol_errors += 1;
                session.send(OutboundFrame::protocol_error()).await?;
                return Ok(Flow::Continue);
            }
        };

        let reply = match session.context.send(&utterance).await {
            Ok(reply) => {
                session.turns += 1;
                OutboundFrame::reply(reply)
            }
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "Model call failed");
                session.upstream_failures += 1;
                OutboundFrame::upstream_failure(&e)
            }
        };
        session.send(reply).await?;
        Ok(Flow::Continue)
    }
}
