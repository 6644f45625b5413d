//! AI Provider Adapters.
//!
//! Implementations of the AIProvider and ChatModel ports.
//!
//! ## Available Adapters
//!
//! - `GeminiProvider` - Google Gemini models over the REST API
//! - `MockAIProvider` - Configurable mock for testing
//! - `ProviderChatModel` - Per-session chat history on top of any provider

mod gemini_provider;
mod mock_provider;
mod provider_chat;

pub use gemini_provider::{
    GeminiConfig, GeminiProvider, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL,
};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use provider_chat::{ChatSettings, ProviderChatContext, ProviderChatModel};
