use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};

use reqwest::StatusCode;

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{RapportError, Result},
    llm::provider::CompletionOptions,
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";

#[derive(Debug, Clone)]
struct ApiConfig {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    config: ApiConfig,
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_config = ApiConfig::from_llm_config(config);

        let (provider, _) = parse_llm_provider_model(&config.model);
        let needs_api_key = !matches!(
            provider.to_lowercase().as_str(),
            "ollama" | "local" | "lmstudio"
        );

        if needs_api_key && api_config.api_key.is_none() {
            return Err(RapportError::Llm(
                "API key required for this provider".to_string(),
            ));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_base(api_config.base_url.clone())
            .with_api_key(api_config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()
            .map_err(|error| {
                RapportError::Llm(format!("Failed to create LLM HTTP client: {error}"))
            })?;

        // async-openai retries server errors on its own; cap that at our timeout.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(api_config.timeout_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            config: api_config,
        })
    }

    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(RapportError::Validation(
                "Prompt cannot be empty".to_string(),
            ));
        }

        let mut attempt = 0;
        loop {
            let request = self.build_request(prompt, system_prompt, options)?;
            let error = match self.client.chat().create(request).await {
                Ok(response) => return Self::extract_content(response),
                Err(error) => error,
            };

            let failure = classify(error);
            if !failure.retryable || attempt >= self.config.max_retries {
                return Err(failure.error);
            }

            tracing::debug!(attempt, error = %failure.error, "Retrying LLM completion");
            tokio::time::sleep(retry_delay(attempt)).await;
            attempt += 1;
        }
    }

    fn build_request(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<CreateChatCompletionRequest> {
        let mut messages = Vec::new();

        if let Some(system_prompt) = system_prompt.filter(|value| !value.trim().is_empty()) {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|error| {
                        RapportError::Validation(format!("Invalid system prompt: {error}"))
                    })?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|error| {
                    RapportError::Validation(format!("Invalid user prompt: {error}"))
                })?
                .into(),
        );

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.config.model.clone()).messages(messages);

        if let Some(options) = options {
            if let Some(temperature) = options.temperature {
                request.temperature(temperature);
            }
            if let Some(max_tokens) = options.max_tokens {
                request.max_tokens(max_tokens);
            }
        }

        request.build().map_err(|error| {
            RapportError::Validation(format!("Invalid LLM completion request: {error}"))
        })
    }

    fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
        let message = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RapportError::Llm("LLM response contained no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        if message.trim().is_empty() {
            return Err(RapportError::Llm(
                "LLM response contained empty content".to_string(),
            ));
        }

        Ok(message)
    }
}

/// A provider error mapped into the crate error, plus whether another
/// attempt could succeed.
struct Failure {
    error: RapportError,
    retryable: bool,
}

impl Failure {
    fn fatal(error: RapportError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }
}

fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(100 * 2_u64.pow(attempt.min(6)))
}

/// Rate limits and auth failures are never retried. Server errors and
/// untyped API errors are.
fn classify(error: OpenAIError) -> Failure {
    match error {
        OpenAIError::Reqwest(e) => match e.status() {
            Some(StatusCode::TOO_MANY_REQUESTS) => {
                Failure::fatal(RapportError::LlmRateLimit { retry_after: None })
            }
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => Failure::fatal(
                RapportError::Llm(format!("LLM authentication failed: {e}")),
            ),
            status => Failure {
                retryable: status.map_or(true, |s| s.is_server_error()),
                error: RapportError::Llm(format!("LLM request failed: {e}")),
            },
        },
        OpenAIError::ApiError(api) => {
            let text = api_error_text(&api);
            if text.contains("rate limit")
                || text.contains("rate_limit")
                || text.contains("too many requests")
                || text.contains("insufficient_quota")
            {
                Failure::fatal(RapportError::LlmRateLimit { retry_after: None })
            } else if text.contains("unauthorized")
                || text.contains("invalid api key")
                || text.contains("invalid_api_key")
                || text.contains("authentication")
            {
                Failure::fatal(RapportError::Llm(format!("LLM authentication failed: {api}")))
            } else {
                Failure {
                    retryable: api.r#type.is_none() && api.code.is_none(),
                    error: RapportError::Llm(format!("LLM API error: {api}")),
                }
            }
        }
        OpenAIError::JSONDeserialize(e) => Failure::fatal(RapportError::Llm(format!(
            "Failed to parse LLM response: {e}"
        ))),
        OpenAIError::InvalidArgument(message) => Failure::fatal(RapportError::Validation(message)),
        other => Failure::fatal(RapportError::Llm(other.to_string())),
    }
}

/// Message, type and code lower-cased into one searchable string.
fn api_error_text(api: &ApiError) -> String {
    format!(
        "{} {} {}",
        api.message,
        api.r#type.as_deref().unwrap_or_default(),
        api.code.as_deref().unwrap_or_default()
    )
    .to_lowercase()
}

impl ApiConfig {
    fn from_llm_config(config: &LlmConfig) -> Self {
        let (provider, model) = parse_llm_provider_model(&config.model);

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        let normalized_model = if provider.eq_ignore_ascii_case("local") {
            config.model.clone()
        } else {
            model.to_string()
        };

        Self {
            base_url,
            api_key: config.api_key.clone(),
            model: normalized_model,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        }
    }
}

fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openai" => OPENAI_BASE_URL,
        "openrouter" => OPENROUTER_BASE_URL,
        "ollama" => OLLAMA_BASE_URL,
        "lmstudio" => LMSTUDIO_BASE_URL,
        _ => OPENAI_BASE_URL,
    }
}
