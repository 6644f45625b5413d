//! Application handlers.
//!
//! Handlers that orchestrate domain operations over the ports.

pub mod chat_session;

pub use chat_session::{ChatSessionHandler, Session, SessionOutcome, SessionSummary};
