//! Application layer - Session handlers.
//!
//! This layer drives one client connection through the chat protocol,
//! coordinating the transport and chat model ports.

pub mod handlers;

pub use handlers::{ChatSessionHandler, Session, SessionOutcome, SessionSummary};
