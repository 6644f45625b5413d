//! Chat Relay - browser chat bridged to a Gemini model over WebSockets.
//!
//! Each WebSocket connection is an independent chat session with its own
//! conversation history. Text frames prefixed with `You: ` are forwarded to
//! the model and answered with a single `AI: ` frame.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod server;
