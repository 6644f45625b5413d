//! HTTP adapters - page and WebSocket endpoints.

pub mod chat;

pub use chat::{chat_router, ChatAppState, WebSocketTransport};
