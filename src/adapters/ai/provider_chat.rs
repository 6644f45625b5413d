//! ChatModel adapter over any [`AIProvider`].
//!
//! Each session gets a [`ProviderChatContext`] holding its own history. A
//! turn replays the whole history plus the new utterance through
//! `stream_complete` and concatenates every delta into one reply.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::ports::{
    AIError, AIProvider, ChatContext, ChatModel, CompletionRequest, Message, RequestMetadata,
};

/// Generation settings applied to every turn.
#[derive(Debug, Clone, Default)]
pub struct ChatSettings {
    /// System instruction sent with every request.
    pub system_prompt: Option<String>,
    /// Output token cap per reply.
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

/// Process-wide chat model backed by one provider.
#[derive(Clone)]
pub struct ProviderChatModel {
    provider: Arc<dyn AIProvider>,
    settings: ChatSettings,
}

impl ProviderChatModel {
    /// Creates a chat model with default settings.
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            settings: ChatSettings::default(),
        }
    }

    /// Sets the generation settings.
    pub fn with_settings(mut self, settings: ChatSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl ChatModel for ProviderChatModel {
    fn start_chat(&self, session_id: SessionId) -> Box<dyn ChatContext> {
        Box::new(ProviderChatContext {
            provider: Arc::clone(&self.provider),
            settings: self.settings.clone(),
            session_id,
            history: Vec::new(),
        })
    }
}

/// History of one session plus the shared provider handle.
pub struct ProviderChatContext {
    provider: Arc<dyn AIProvider>,
    settings: ChatSettings,
    session_id: SessionId,
    history: Vec<Message>,
}

impl ProviderChatContext {
    fn build_request(&self, text: &str) -> CompletionRequest {
        let mut messages = self.history.clone();
        messages.push(Message::user(text));

        let mut request =
            CompletionRequest::new(RequestMetadata::new(self.session_id)).with_messages(messages);
        if let Some(prompt) = &self.settings.system_prompt {
            request = request.with_system_prompt(prompt.clone());
        }
        if let Some(max) = self.settings.max_output_tokens {
            request = request.with_max_tokens(max);
        }
        if let Some(temp) = self.settings.temperature {
            request = request.with_temperature(temp);
        }
        request
    }
}

#[async_trait]
impl ChatContext for ProviderChatContext {
    async fn send(&mut self, text: &str) -> Result<String, AIError> {
        let request = self.build_request(text);
        let mut stream = self.provider.stream_complete(request).await?;

        let mut reply = String::new();
        let mut chunks = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            reply.push_str(&chunk.delta);
            chunks += 1;
            if chunk.is_final() {
                break;
            }
        }

        tracing::debug!(
            session_id = %self.session_id,
            chunks,
            reply_len = reply.len(),
            "Model reply assembled"
        );

        self.history.push(Message::user(text));
        self.history.push(Message::assistant(reply.clone()));
        Ok(reply)
    }

    fn history(&self) -> &[Message] {
        &self.history
    }
}
