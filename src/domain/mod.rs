//! Domain layer containing the chat protocol and session lifecycle types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, state machine, errors)
//! - `chat` - Wire frames exchanged with the browser client

pub mod chat;
pub mod foundation;
