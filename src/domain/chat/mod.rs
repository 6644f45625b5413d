//! Chat protocol domain.
//!
//! The wire format is line oriented and human readable: the client sends
//! `You: <utterance>`, the server answers `AI: <reply>`.

mod frame;

pub use frame::{
    FrameError, InboundFrame, OutboundFrame, AI_PREFIX, EXIT_KEYWORD, USER_MARKER,
};
