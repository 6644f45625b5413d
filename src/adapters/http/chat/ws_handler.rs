//! WebSocket endpoint and the [`FrameTransport`] over an axum socket.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use super::ChatAppState;
use crate::domain::chat::OutboundFrame;
use crate::ports::{FrameTransport, InboundEvent, TransportError};

/// WebSocket upgrade handler.
///
/// Each accepted upgrade is served as one independent chat session.
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<ChatAppState>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        state.handler.serve(WebSocketTransport::new(socket)).await;
    })
}

/// Text-frame transport over an upgraded axum WebSocket.
///
/// The socket is dropped on the first `close`, so later calls are no-ops.
pub struct WebSocketTransport {
    socket: Option<WebSocket>,
}

impl WebSocketTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self {
            socket: Some(socket),
        }
    }
}

#[async_trait]
impl FrameTransport for WebSocketTransport {
    async fn recv(&mut self) -> Result<InboundEvent, TransportError> {
        let Some(socket) = self.socket.as_mut() else {
            return Ok(InboundEvent::Closed);
        };

        loop {
            match socket.recv().await {
                Some(Ok(Message::Text(text))) => return Ok(InboundEvent::Text(text)),
                Some(Ok(Message::Binary(_))) => return Ok(InboundEvent::Binary),
                // tungstenite answers pings itself
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(?frame, "Client sent close frame");
                    return Ok(InboundEvent::Closed);
                }
                None => return Ok(InboundEvent::Closed),
                Some(Err(e)) => return Err(TransportError::Io(e.to_string())),
            }
        }
    }

    async fn send(&mut self, frame: OutboundFrame) -> Result<(), TransportError> {
        let socket = self.socket.as_mut().ok_or(TransportError::Closed)?;
        socket
            .send(Message::Text(frame.into_string()))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.send(Message::Close(None)).await {
                tracing::debug!(error = %e, "Close frame not delivered");
            }
        }
    }
}
