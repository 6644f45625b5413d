//! AI provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound for `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 5;
use crate::adapters::ai::{
    ChatSettings, GeminiConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL,
};

/// Gemini model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Gemini API key
    pub gemini_api_key: Option<SecretString>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// System instruction sent with every turn
    pub system_prompt: Option<String>,

    /// Output token cap per reply
    pub max_output_tokens: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Request timeout in seconds. Unset waits indefinitely.
    pub request_timeout_secs: Option<u64>,

    /// Maximum retries on transient failures
    #[serde(default)]
    pub max_retries: u32,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Check if a Gemini key is configured
    pub fn has_gemini(&self) -> bool {
        self.gemini_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    /// Builds the provider configuration.
    pub fn gemini_config(&self) -> Result<GeminiConfig, ValidationError> {
        let key = self
            .gemini_api_key
            .as_ref()
            .filter(|_| self.has_gemini())
            .ok_or(ValidationError::MissingRequired("GEMINI_API_KEY"))?;

        let mut config = GeminiConfig::new(key.expose_secret().clone())
            .with_model(self.model.clone())
            .with_base_url(self.base_url.clone())
            .with_max_retries(self.max_retries);
        if let Some(timeout) = self.timeout() {
            config = config.with_timeout(timeout);
        }
        Ok(config)
    }

    /// Generation settings applied to every chat turn.
    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            system_prompt: self.system_prompt.clone().filter(|p| !p.trim().is_empty()),
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
        }
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_gemini() {
            return Err(ValidationError::MissingRequired("GEMINI_API_KEY"));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AI__MODEL"));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ValidationError::TooManyRetries(MAX_RETRIES_LIMIT));
        }
        if self.max_output_tokens == Some(0) {
            return Err(ValidationError::InvalidMaxOutputTokens);
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ValidationError::InvalidTemperature);
            }
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            system_prompt: None,
            max_output_tokens: None,
            temperature: None,
            request_timeout_secs: None,
            max_retries: 0,
        }
    }
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}
