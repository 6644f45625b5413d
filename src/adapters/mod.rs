//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the chat session logic to external systems:
//! - `ai` - LLM providers and the chat model built on them
//! - `http` - Axum router, bootstrap page, and the WebSocket transport

pub mod ai;
pub mod http;
