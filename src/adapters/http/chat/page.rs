//! Bootstrap page for the browser client.

use axum::response::Html;

/// Single-document chat client. It opens `/chat/ws` on the serving host,
/// lists every frame, and styles lines starting with `AI:` as replies.
pub const CHAT_PAGE: &str = include_str!("../../../../static/chat.html");

/// Serves the bootstrap page.
pub async fn chat_page() -> Html<&'static str> {
    Html(CHAT_PAGE)
}
