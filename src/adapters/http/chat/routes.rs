//! Axum routes for the chat endpoints.

use axum::routing::get;
use axum::Router;

use super::{chat_page, chat_ws_handler};
use crate::application::ChatSessionHandler;

/// State shared by every chat connection.
#[derive(Clone)]
pub struct ChatAppState {
    /// Session handler wrapping the process-wide chat model.
    pub handler: ChatSessionHandler,
}

impl ChatAppState {
    pub fn new(handler: ChatSessionHandler) -> Self {
        Self { handler }
    }
}

/// Creates routes for the chat endpoints.
///
/// - GET /chat and /chat/ - Bootstrap page
/// - WS /chat/ws - Chat session
pub fn chat_router() -> Router<ChatAppState> {
    Router::new()
        .route("/chat", get(chat_page))
        .route("/chat/", get(chat_page))
        .route("/chat/ws", get(chat_ws_handler))
}
