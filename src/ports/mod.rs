//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the chat session logic and the outside world. Adapters implement them.
//!
//! - `AIProvider` - Raw completion API of an LLM vendor
//! - `ChatModel` / `ChatContext` - Conversation contract consumed by a session
//! - `FrameTransport` - One client connection carrying text frames

mod ai_provider;
mod chat_model;
mod frame_transport;

pub use ai_provider::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    Message, MessageRole, ProviderInfo, RequestMetadata, StreamChunk, TokenUsage,
};
pub use chat_model::{ChatContext, ChatModel};
pub use frame_transport::{FrameTransport, InboundEvent, TransportError};
