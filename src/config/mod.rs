//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CHAT_RELAY` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use chat_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod ai;
mod error;
mod server;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{LogFormat, ServerConfig};

use secrecy::SecretString;
use serde::Deserialize;

/// Unprefixed key variable honoured when `CHAT_RELAY__AI__GEMINI_API_KEY` is unset.
pub const LEGACY_API_KEY_VAR: &str = "API_KEY";

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (bind address, logging, CORS)
    #[serde(default)]
    pub server: ServerConfig,

    /// Gemini model configuration
    #[serde(default)]
    pub ai: AiConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CHAT_RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Falls back to `API_KEY` for the Gemini key
    ///
    /// # Environment Variable Format
    ///
    /// - `CHAT_RELAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CHAT_RELAY__AI__GEMINI_API_KEY=...` -> `ai.gemini_api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    /// A missing key is only reported by [`AppConfig::validate()`].
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut config: AppConfig = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHAT_RELAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        if !config.ai.has_gemini() {
            if let Some(key) = std::env::var(LEGACY_API_KEY_VAR)
                .ok()
                .filter(|k| !k.trim().is_empty())
            {
                config.ai.gemini_api_key = Some(SecretString::new(key));
            }
        }

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        Ok(())
    }
}
