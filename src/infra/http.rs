use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

use crate::config::{Provider, RequestConfig};
use crate::error::{AppError, AppResult};
use crate::infra::anthropic::AnthropicProvider;
use crate::infra::openai::OpenAiProvider;
use crate::prompt::Prompt;
use crate::services::language_model::{LanguageModelProvider, envelope_error_message};

const ERROR_BODY_LIMIT: usize = 500;

pub fn provider_for(provider: Provider) -> Box<dyn LanguageModelProvider> {
    match provider {
        Provider::OpenAi => Box::new(OpenAiProvider::new()),
        Provider::Anthropic => Box::new(AnthropicProvider::new()),
    }
}

/// Sends one request to the configured provider and returns the assistant's
/// raw text. A failed attempt is returned as is; there is no retry.
pub async fn send(config: &RequestConfig, prompt: &Prompt) -> AppResult<String> {
    config.validate()?;
    let provider = provider_for(config.provider);
    let request = provider.build_request(config, prompt);

    let http = Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()
        .map_err(|err| AppError::Transport(format!("failed to build HTTP client: {err}")))?;

    let mut builder = http
        .post(&request.url)
        .header(ACCEPT, "application/json")
        .header(CONTENT_TYPE, "application/json")
        .json(&request.body);
    for (name, value) in &request.headers {
        builder = builder.header(*name, value);
    }

    tracing::debug!(
        provider = provider.name(),
        model = %config.model,
        url = %request.url,
        "sending classification request"
    );
    let started = Instant::now();

    let response = builder.send().await.map_err(|err| {
        if err.is_timeout() {
            AppError::Transport(format!(
                "{} request timed out after {}s",
                provider.name(),
                config.timeout_seconds
            ))
        } else {
            AppError::Transport(format!("failed to call {}: {err}", provider.name()))
        }
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|err| {
        AppError::Transport(format!("failed to read {} response: {err}", provider.name()))
    })?;

    tracing::debug!(
        provider = provider.name(),
        status = status.as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "received classification response"
    );

    if !status.is_success() {
        return Err(AppError::Provider(format!(
            "{} responded with {status}: {}",
            provider.name(),
            error_detail(&body)
        )));
    }

    let payload: Value = serde_json::from_str(&body).map_err(|err| {
        AppError::Provider(format!("failed to parse {} response: {err}", provider.name()))
    })?;

    provider.extract_text(&payload)
}

/// The provider's `error.message` when the body is an error envelope,
/// otherwise the leading part of the raw body.
fn error_detail(body: &str) -> String {
    if let Some(message) = serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(envelope_error_message)
    {
        return message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty response body>".to_string();
    }
    trimmed.chars().take(ERROR_BODY_LIMIT).collect()
}
