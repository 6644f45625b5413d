//! Chat Model Port - The conversation contract a session consumes.
//!
//! A [`ChatModel`] is process-wide and read-only; it hands every session its
//! own [`ChatContext`]. The context owns the history and replays it to the
//! provider on each turn, so the session handler never touches history.

use async_trait::async_trait;

use super::{AIError, Message};
use crate::domain::foundation::SessionId;

/// Factory for per-session conversation contexts.
pub trait ChatModel: Send + Sync {
    /// Starts a new, empty conversation. Performs no network I/O.
    fn start_chat(&self, session_id: SessionId) -> Box<dyn ChatContext>;
}

/// One ordered, append-only conversation.
#[async_trait]
pub trait ChatContext: Send {
    /// Sends `text` as the next user turn and returns the complete reply.
    ///
    /// Incremental provider output is reassembled before returning. On error
    /// the history is left exactly as it was before the call.
    async fn send(&mut self, text: &str) -> Result<String, AIError>;

    /// All successful exchanges so far, oldest first, alternating
    /// user and assistant messages.
    fn history(&self) -> &[Message];
}
