use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Completion timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid completion request: {0}")]
    InvalidRequest(String),
}

impl CompletionError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CompletionError::InvalidRequest(_))
    }
}

/// One prompt sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Diagnostic label, e.g. `sections` or `mc-hard`.
    pub context: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(context: impl Into<String>, prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            context: context.into(),
            prompt: prompt.into(),
            temperature,
            max_tokens,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// Chat-completion client for any OpenAI-compatible endpoint (Ollama by default).
pub struct OpenAiCompletionProvider {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiCompletionProvider {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.llm_api_key.expose_secret())
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        log::debug!(
            "Calling model {} for {} (prompt length: {} chars)",
            self.model_name,
            request.context,
            request.prompt.len()
        );

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt.as_str())
            .build()
            .map_err(|e| CompletionError::InvalidRequest(e.to_string()))?;

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(message)])
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .build()
            .map_err(|e| CompletionError::InvalidRequest(e.to_string()))?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            log::warn!("Model call for {} failed: {}", request.context, e);
            CompletionError::Transport(e.to_string())
        })?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
            .ok_or(CompletionError::EmptyResponse)
    }
}

/// Exponential backoff for retryable completion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            multiplier: 2,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.llm_max_retries,
            Duration::from_millis(config.llm_retry_backoff_ms),
        )
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry);
        self.initial_backoff.saturating_mul(factor)
    }

    pub async fn run<T, F, Fut>(&self, context: &str, mut operation: F) -> Result<T, CompletionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CompletionError>>,
    {
        let mut retry = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retry < self.max_retries => {
                    let delay = self.backoff_for(retry);
                    log::warn!(
                        "Attempt {} for {} failed: {}. Retrying in {:?}",
                        retry + 1,
                        context,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Runs `request` under `policy`, bounding every attempt by `timeout`.
pub async fn complete_with_retry(
    provider: &dyn CompletionProvider,
    request: &CompletionRequest,
    policy: &RetryPolicy,
    timeout: Duration,
) -> Result<String, CompletionError> {
    policy
        .run(&request.context, || async move {
            tokio::time::timeout(timeout, provider.complete(request))
                .await
                .map_err(|_| CompletionError::Timeout(timeout.as_secs()))?
        })
        .await
}
