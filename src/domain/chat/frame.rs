//! Inbound and outbound chat frames.
//!
//! One frame is one WebSocket text message. Inbound frames must start with
//! the user marker `you: ` (ASCII case-insensitive, the space included).
//! Outbound frames always start with `AI: `.

use std::fmt;
use thiserror::Error;

/// Marker every inbound frame must start with, compared case-insensitively.
pub const USER_MARKER: &str = "you: ";

/// Prefix of every outbound frame.
pub const AI_PREFIX: &str = "AI: ";

/// Body that ends the session, compared case-insensitively after trimming.
pub const EXIT_KEYWORD: &str = "exit";

const PROTOCOL_ERROR_TEXT: &str = "Please start your message with 'You: '";
const GOODBYE_TEXT: &str = "Ending chat session.";

/// A decoded client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Text to forward to the model, exactly as typed after the marker.
    Utterance(String),
    /// The client asked to end the session.
    Exit,
}

/// Reasons an inbound frame is rejected. All of them are recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame does not start with the user marker")]
    MissingUserMarker,

    #[error("binary frames are not supported")]
    NotText,
}

impl InboundFrame {
    /// Decodes one client text frame.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let marker_len = USER_MARKER.len();
        let has_marker = text
            .get(..marker_len)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(USER_MARKER));
        if !has_marker {
            return Err(FrameError::MissingUserMarker);
        }

        let body = &text[marker_len..];
        if body.trim().eq_ignore_ascii_case(EXIT_KEYWORD) {
            Ok(InboundFrame::Exit)
        } else {
            Ok(InboundFrame::Utterance(body.to_string()))
        }
    }
}

/// A server frame, always carrying the `AI: ` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame(String);

impl OutboundFrame {
    /// Wraps a model reply.
    pub fn reply(text: impl AsRef<str>) -> Self {
        Self(format!("{}{}", AI_PREFIX, text.as_ref()))
    }

    /// The answer to any frame rejected with a [`FrameError`].
    pub fn protocol_error() -> Self {
        Self::reply(PROTOCOL_ERROR_TEXT)
    }

    /// Last frame sent before the server closes on `exit`.
    pub fn goodbye() -> Self {
        Self::reply(GOODBYE_TEXT)
    }

    /// Best-effort report of a failed model call. The session stays open.
    pub fn upstream_failure(error: &dyn fmt::Display) -> Self {
        Self::reply(format!(
            "Sorry, I couldn't get a response from the model ({})",
            error
        ))
    }

    /// Returns the full frame text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the frame, returning its text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OutboundFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
