//! Chat HTTP adapter.
//!
//! - `GET /chat/` - bootstrap page
//! - `GET /chat/ws` - WebSocket upgrade into a chat session

mod page;
mod routes;
mod ws_handler;

pub use page::{chat_page, CHAT_PAGE};
pub use routes::{chat_router, ChatAppState};
pub use ws_handler::{chat_ws_handler, WebSocketTransport};
