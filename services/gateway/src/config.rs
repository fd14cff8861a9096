//! Gateway configuration, loaded once at startup from environment variables.

use std::env;
use tracing::Level;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: String,
    pub chat_model: String,
    pub transcription_model: String,
    pub vision_model: String,
    pub bind_addr: String,
    pub log_level: Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `LLM_API_KEY`: Secret key for the OpenAI-compatible API. Required.
    // *   `LLM_API_BASE_URL`: (Optional) API base URL. Defaults to "https://api.groq.com/openai/v1".
    // *   `CHAT_MODEL`: (Optional) Model for question/evaluation/report generation. Defaults to "llama-3.3-70b-versatile".
    // *   `TRANSCRIPTION_MODEL`: (Optional) Speech-to-text model. Defaults to "whisper-large-v3".
    // *   `VISION_MODEL`: (Optional) Vision-description model. Defaults to "google/gemma-3-27b-it".
    // *   `BIND_ADDR`: (Optional) Socket address to listen on. Defaults to "0.0.0.0:3000".
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. Useful for local development, ignored if not present.
        dotenvy::dotenv().ok();

        let api_key = env::var("LLM_API_KEY")
            .map_err(|_| ConfigError::MissingVar("LLM_API_KEY".to_string()))?;
        let api_base_url = env::var("LLM_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string());
        let chat_model =
            env::var("CHAT_MODEL").unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string());
        let transcription_model =
            env::var("TRANSCRIPTION_MODEL").unwrap_or_else(|_| "whisper-large-v3".to_string());
        let vision_model =
            env::var("VISION_MODEL").unwrap_or_else(|_| "google/gemma-3-27b-it".to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let log_level_str = env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            api_key,
            api_base_url,
            chat_model,
            transcription_model,
            vision_model,
            bind_addr,
            log_level,
        })
    }
}
