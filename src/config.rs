use secrecy::SecretString;
use std::env;

use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub llm_enabled: bool,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_api_key: SecretString,
    pub llm_max_tokens: u32,
    pub llm_max_retries: u32,
    pub llm_retry_backoff_ms: u64,
    pub llm_timeout_seconds: u64,
    pub shuffle_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            llm_enabled: env::var("LLM_ENABLED")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(true),
            llm_api_base_url: env::var("LLM_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434/v1".to_string()),
            llm_model_name: env::var("LLM_MODEL_NAME")
                .unwrap_or_else(|_| "llama3.1:8b".to_string()),
            llm_api_key: SecretString::from(
                env::var("LLM_API_KEY").unwrap_or_else(|_| "ollama".to_string()),
            ),
            llm_max_tokens: env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4096),
            llm_max_retries: env::var("LLM_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            llm_retry_backoff_ms: env::var("LLM_RETRY_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
            llm_timeout_seconds: env::var("LLM_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            shuffle_seed: env::var("QUIZ_SHUFFLE_SEED")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Checks the settings the model-backed path depends on.
    pub fn validate(&self) -> AppResult<()> {
        if !self.llm_enabled {
            return Ok(());
        }

        if self.llm_api_base_url.trim().is_empty() {
            return Err(AppError::ConfigError(
                "LLM_API_BASE_URL must be set when LLM_ENABLED is true".to_string(),
            ));
        }

        if self.llm_model_name.trim().is_empty() {
            return Err(AppError::ConfigError(
                "LLM_MODEL_NAME must be set when LLM_ENABLED is true".to_string(),
            ));
        }

        if self.llm_max_tokens == 0 {
            return Err(AppError::ConfigError(
                "LLM_MAX_TOKENS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            llm_enabled: true,
            llm_api_base_url: "http://127.0.0.1:11434/v1".to_string(),
            llm_model_name: "test-model".to_string(),
            llm_api_key: SecretString::from("test-key".to_string()),
            llm_max_tokens: 1024,
            llm_max_retries: 1,
            llm_retry_backoff_ms: 0,
            llm_timeout_seconds: 5,
            shuffle_seed: Some(7),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
