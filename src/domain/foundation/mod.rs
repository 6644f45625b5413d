//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, lifecycle state machines, and error types
//! that form the vocabulary of the chat relay domain.

mod errors;
mod ids;
mod session_status;
mod state_machine;

pub use errors::ValidationError;
pub use ids::SessionId;
pub use session_status::SessionStatus;
pub use state_machine::StateMachine;
