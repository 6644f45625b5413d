//! Gemini Provider - Implementation of AIProvider for Google's Gemini API.
//!
//! Talks to the `v1beta` REST surface of the Generative Language API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key)
//!     .with_model("gemini-1.5-flash")
//!     .with_base_url("https://generativelanguage.googleapis.com");
//!
//! let provider = GeminiProvider::new(config)?;
//! ```
//!
//! # Streaming
//!
//! `streamGenerateContent?alt=sse` returns Server-Sent Events whose `data:`
//! payloads are complete `GenerateContentResponse` JSON objects. Network
//! chunks do not respect event boundaries, so bytes are buffered until a
//! full event is available.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    MessageRole, ProviderInfo, StreamChunk, TokenUsage,
};

/// Model used when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Public endpoint of the Generative Language API.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    api_key: SecretString,
    /// Model to use (e.g., "gemini-1.5-flash").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Maximum retries on transient failures before any reply bytes arrive.
    pub max_retries: u32,
}

impl GeminiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: None,
            max_retries: 0,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, AIError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AIError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Builds the URL of a model method such as `generateContent`.
    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    /// Converts our request to Gemini's format.
    fn to_gemini_request(request: &CompletionRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                GeminiContent::text(Some(role), &msg.content)
            })
            .collect();

        let generation_config = if request.max_tokens.is_some() || request.temperature.is_some() {
            Some(GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            })
        } else {
            None
        };

        GeminiRequest {
            contents,
            system_instruction: request
                .system_prompt
                .as_deref()
                .map(|prompt| GeminiContent::text(None, prompt)),
            generation_config,
        }
    }

    /// Posts to a model method, retrying transient failures with
    /// exponential backoff (see [`backoff_delay`]).
    async fn post(&self, method: &str, body: &GeminiRequest) -> Result<Response, AIError> {
        let mut retry_count = 0;

        loop {
            let result = match self.send_once(method, body).await {
                Ok(response) => Self::handle_response_status(response).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    tracing::warn!(
                        error = %err,
                        attempt = retry_count + 1,
                        "Gemini request failed, retrying"
                    );
                    sleep(backoff_delay(retry_count)).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(&self, method: &str, body: &GeminiRequest) -> Result<Response, AIError> {
        let mut request = self
            .client
            .post(self.method_url(method))
            .header("x-goog-api-key", self.config.api_key())
            .json(body);
        if method == STREAM_METHOD {
            request = request.query(&[("alt", "sse")]);
        }

        request.send().await.map_err(|e| self.map_transport_error(e))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> AIError {
        if e.is_timeout() {
            AIError::Timeout {
                timeout_secs: self.config.timeout.map_or(0, |t| t.as_secs() as u32),
            }
        } else if e.is_connect() {
            AIError::network(format!("Connection failed: {}", e))
        } else {
            AIError::network(e.to_string())
        }
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after_header = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok());
        let error_body = response.text().await.unwrap_or_default();

        Err(map_status_error(status.as_u16(), &error_body, retry_after_header))
    }
}

/// Backoff stops doubling after this many retries (32s).
const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Delay before retry number `retry_count` (0-based): 1s, 2s, 4s, ... 32s.
fn backoff_delay(retry_count: u32) -> Duration {
    Duration::from_secs(1 << retry_count.min(MAX_BACKOFF_EXPONENT))
}

const GENERATE_METHOD: &str = "generateContent";
const STREAM_METHOD: &str = "streamGenerateContent";

/// Maps an HTTP error status and Gemini error body to an [`AIError`].
fn map_status_error(status: u16, body: &str, retry_after: Option<u32>) -> AIError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|p| p.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body));

    match status {
        401 | 403 => AIError::AuthenticationFailed,
        400 if message.contains("API key") => AIError::AuthenticationFailed,
        400 if message.contains("token") && message.contains("exceed") => {
            AIError::ContextTooLong(message)
        }
        400 | 404 => AIError::InvalidRequest(message),
        429 => {
            let from_body = parsed.as_ref().and_then(ApiErrorEnvelope::retry_delay_secs);
            AIError::rate_limited(retry_after.or(from_body).unwrap_or(60))
        }
        500..=599 => AIError::unavailable(format!("Server error {}: {}", status, message)),
        _ => AIError::network(format!("Unexpected status {}: {}", status, message)),
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let body = Self::to_gemini_request(&request);
        let response = self.post(GENERATE_METHOD, &body).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;
        let model = parsed
            .model_version
            .clone()
            .unwrap_or_else(|| self.config.model.clone());

        let mut content = String::new();
        let mut finish_reason = FinishReason::Stop;
        let mut usage = TokenUsage::default();
        for chunk in chunks_from_response(parsed) {
            let chunk = chunk?;
            content.push_str(&chunk.delta);
            if let Some(reason) = chunk.finish_reason {
                finish_reason = reason;
            }
            if let Some(u) = chunk.usage {
                usage = u;
            }
        }

        Ok(CompletionResponse {
            content,
            usage,
            model,
            finish_reason,
        })
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        tracing::debug!(
            session_id = %request.metadata.session_id,
            model = %self.config.model,
            message_count = request.messages.len(),
            "Starting Gemini stream"
        );

        let body = Self::to_gemini_request(&request);
        let response = self.post(STREAM_METHOD, &body).await?;
        let bytes = Box::pin(response.bytes_stream());

        let payloads = stream::unfold(
            Some((bytes, SseDecoder::default())),
            |state| async move {
                let (mut bytes, mut decoder) = state?;
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        let payloads: Vec<Result<String, AIError>> =
                            decoder.push(&chunk).into_iter().map(Ok).collect();
                        Some((payloads, Some((bytes, decoder))))
                    }
                    Some(Err(e)) => Some((
                        vec![Err(AIError::network(format!("Stream error: {}", e)))],
                        None,
                    )),
                    None => Some((decoder.finish().into_iter().map(Ok).collect(), None)),
                }
            },
        )
        .flat_map(stream::iter);

        let chunks = payloads.flat_map(|payload| {
            stream::iter(match payload {
                Ok(data) => parse_gemini_event(&data),
                Err(e) => vec![Err(e)],
            })
        });

        Ok(Box::pin(chunks))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("gemini", &self.config.model).with_streaming(true)
    }
}

/// Accumulates SSE bytes and yields complete event payloads.
///
/// Multiple `data:` lines of one event are joined with `\n`; the event ends
/// at a blank line. Comment lines and other fields are ignored.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.take_event() {
                    events.push(event);
                }
            } else if let Some(data) = line.strip_prefix("data:") {
                self.data_lines
                    .push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }

        events
    }

    /// Flushes an event left open when the stream ends without a blank line.
    fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            if let Some(data) = line.trim_end_matches('\r').strip_prefix("data:") {
                self.data_lines
                    .push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }
        self.take_event()
    }

    fn take_event(&mut self) -> Option<String> {
        if self.data_lines.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.data_lines).join("\n"))
        }
    }
}

/// Parses one SSE payload into stream chunks.
fn parse_gemini_event(data: &str) -> Vec<Result<StreamChunk, AIError>> {
    match serde_json::from_str::<GenerateContentResponse>(data) {
        Ok(response) => chunks_from_response(response),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse Gemini SSE chunk");
            vec![Err(AIError::parse(format!("Invalid stream event: {}", e)))]
        }
    }
}

/// Converts one `GenerateContentResponse` into content and final chunks.
fn chunks_from_response(response: GenerateContentResponse) -> Vec<Result<StreamChunk, AIError>> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        return vec![Err(AIError::content_filtered(reason))];
    }

    let usage = response
        .usage_metadata
        .as_ref()
        .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Vec::new();
    };

    let mut results = Vec::new();
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if !text.is_empty() {
        results.push(Ok(StreamChunk::content(text)));
    }

    match candidate.finish_reason.as_deref() {
        None | Some("FINISH_REASON_UNSPECIFIED") => {}
        Some("STOP") => results.push(Ok(StreamChunk::final_chunk(FinishReason::Stop, usage))),
        Some("MAX_TOKENS") => {
            results.push(Ok(StreamChunk::final_chunk(FinishReason::Length, usage)))
        }
        Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII")) => {
            results.push(Err(AIError::content_filtered(reason)))
        }
        Some(_) => results.push(Ok(StreamChunk::final_chunk(FinishReason::Stop, usage))),
    }

    results
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl ApiErrorEnvelope {
    /// Reads `RetryInfo.retryDelay` (e.g. `"37s"`) from the error details.
    fn retry_delay_secs(&self) -> Option<u32> {
        self.error.details.iter().find_map(|detail| {
            let delay = detail.get("retryDelay")?.as_str()?;
            let secs = delay.strip_suffix('s')?.parse::<f64>().ok()?;
            Some(secs.ceil() as u32)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use crate::ports::{Message, RequestMetadata};

    fn request_with_history() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(SessionId::new())).with_messages(vec![
            Message::user("Hello"),
            Message::assistant("Hi there!"),
            Message::user("How are you?"),
        ])
    }

    #[test]
    fn config_builder_works() {
        let config = GeminiConfig::new("test-key")
            .with_model("gemini-1.5-pro")
            .with_base_url("http://localhost:9999")
            .with_timeout(Duration::from_secs(30))
            .with_max_retries(2);

        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn config_defaults_have_no_timeout_or_retries() {
        let config = GeminiConfig::new("k");
        assert_eq!(config.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = GeminiConfig::new("super-secret-key");
        assert!(!format!("{:?}", config).contains("super-secret-key"));
    }

    #[test]
    fn method_url_joins_base_and_model() {
        let provider =
            GeminiProvider::new(GeminiConfig::new("k").with_base_url("http://host/")).unwrap();
        assert_eq!(
            provider.method_url(STREAM_METHOD),
            "http://host/v1beta/models/gemini-1.5-flash:streamGenerateContent"
        );
    }

    #[test]
    fn request_maps_roles_and_preserves_order() {
        let body = serde_json::to_value(GeminiProvider::to_gemini_request(
            &request_with_history(),
        ))
        .unwrap();

        let roles: Vec<&str> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(body["contents"][2]["parts"][0]["text"], "How are you?");
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn request_includes_system_instruction_and_generation_config() {
        let request = request_with_history()
            .with_system_prompt("Be brief")
            .with_max_tokens(256);
        let body = serde_json::to_value(GeminiProvider::to_gemini_request(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert!(body["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn sse_decoder_handles_split_events() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: {\"a\":").is_empty());
        assert!(decoder.push(b"1}\r\n").is_empty());
        let events = decoder.push(b"\r\ndata: {\"b\":2}\n\n");
        assert_eq!(events, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
    }

    #[test]
    fn sse_decoder_keeps_multibyte_characters_split_across_chunks() {
        let payload = "data: {\"t\":\"é\"}\n\n".as_bytes();
        let split = payload.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(&payload[..split]).is_empty());
        assert_eq!(decoder.push(&payload[split..]), vec!["{\"t\":\"é\"}".to_string()]);
    }

    #[test]
    fn sse_decoder_flushes_unterminated_event() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b": comment\ndata: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn parse_event_with_text() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#;
        let chunks = parse_gemini_event(data);

        assert_eq!(chunks.len(), 1);
        let chunk = chunks[0].as_ref().unwrap();
        assert_eq!(chunk.delta, "Hello");
        assert!(!chunk.is_final());
    }

    #[test]
    fn parse_event_with_stop_emits_final_chunk_with_usage() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"!"}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":4,"candidatesTokenCount":2,"totalTokenCount":6}}"#;
        let chunks = parse_gemini_event(data);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].as_ref().unwrap().delta, "!");
        let last = chunks[1].as_ref().unwrap();
        assert_eq!(last.finish_reason, Some(FinishReason::Stop));
        assert_eq!(last.usage, Some(TokenUsage::new(4, 2)));
    }

    #[test]
    fn parse_event_max_tokens_maps_to_length() {
        let data = r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#;
        let chunks = parse_gemini_event(data);
        assert_eq!(
            chunks[0].as_ref().unwrap().finish_reason,
            Some(FinishReason::Length)
        );
    }

    #[test]
    fn parse_event_safety_stop_is_content_filtered() {
        let data = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let chunks = parse_gemini_event(data);
        assert!(matches!(
            chunks[0],
            Err(AIError::ContentFiltered { ref reason }) if reason == "SAFETY"
        ));
    }

    #[test]
    fn parse_event_blocked_prompt_is_content_filtered() {
        let data = r#"{"promptFeedback":{"blockReason":"OTHER"}}"#;
        let chunks = parse_gemini_event(data);
        assert_eq!(chunks.len(), 1);
        assert!(matches!(chunks[0], Err(AIError::ContentFiltered { .. })));
    }

    #[test]
    fn parse_event_rejects_invalid_json() {
        let chunks = parse_gemini_event("not json");
        assert!(matches!(chunks[0], Err(AIError::Parse(_))));
    }

    #[test]
    fn status_errors_map_to_ai_errors() {
        assert!(matches!(
            map_status_error(403, "{}", None),
            AIError::AuthenticationFailed
        ));
        assert!(matches!(
            map_status_error(
                400,
                r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#,
                None
            ),
            AIError::AuthenticationFailed
        ));
        assert!(matches!(
            map_status_error(
                400,
                r#"{"error":{"message":"The input token count exceeds the maximum number of tokens allowed"}}"#,
                None
            ),
            AIError::ContextTooLong(_)
        ));
        assert!(matches!(
            map_status_error(400, r#"{"error":{"message":"contents is not specified"}}"#, None),
            AIError::InvalidRequest(ref m) if m == "contents is not specified"
        ));
        assert!(matches!(
            map_status_error(503, "overloaded", None),
            AIError::Unavailable { .. }
        ));
    }

    #[test]
    fn rate_limit_prefers_header_then_body_then_default() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","details":[{"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"37s"}]}}"#;

        assert!(matches!(
            map_status_error(429, body, Some(5)),
            AIError::RateLimited { retry_after_secs: 5 }
        ));
        assert!(matches!(
            map_status_error(429, body, None),
            AIError::RateLimited { retry_after_secs: 37 }
        ));
        assert!(matches!(
            map_status_error(429, "", None),
            AIError::RateLimited { retry_after_secs: 60 }
        ));
    }

    #[test]
    fn backoff_doubles_then_stays_capped() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(5), Duration::from_secs(32));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_secs(32));
    }

    #[test]
    fn provider_info_reports_model() {
        let provider = GeminiProvider::new(GeminiConfig::new("k")).unwrap();
        let info = provider.provider_info();
        assert_eq!(info.name, "gemini");
        assert_eq!(info.model, "gemini-1.5-flash");
        assert!(info.supports_streaming);
    }
}
