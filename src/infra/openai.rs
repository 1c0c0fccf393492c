use serde_json::{Value, json};

use crate::config::RequestConfig;
use crate::error::{AppError, AppResult};
use crate::prompt::Prompt;
use crate::services::language_model::{
    LanguageModelProvider, ProviderRequest, envelope_error_message,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI responses endpoint.
pub struct OpenAiProvider;

impl OpenAiProvider {
    pub fn new() -> Self {
        Self
    }

    fn endpoint(base_url: Option<&str>) -> String {
        format!(
            "{}/v1/responses",
            base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/')
        )
    }
}

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageModelProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn build_request(&self, config: &RequestConfig, prompt: &Prompt) -> ProviderRequest {
        let mut body = json!({
            "model": config.model,
            "instructions": prompt.system,
            "input": prompt.user,
            "max_output_tokens": config.max_output_tokens,
        });
        if let Some(store) = config.store {
            body["store"] = json!(store);
        }
        if config.supports_temperature() {
            body["temperature"] = json!(config.temperature);
        }

        ProviderRequest {
            url: Self::endpoint(config.base_url.as_deref()),
            headers: vec![("authorization", format!("Bearer {}", config.api_key))],
            body,
        }
    }

    fn extract_text(&self, body: &Value) -> AppResult<String> {
        if let Some(message) = envelope_error_message(body) {
            return Err(AppError::Provider(message));
        }

        match body.get("status").and_then(Value::as_str) {
            Some("completed") => {}
            Some("incomplete") => {
                let reason = body
                    .pointer("/incomplete_details/reason")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown reason");
                return Err(AppError::IncompleteResponse(reason.to_string()));
            }
            Some(other) => {
                return Err(AppError::Provider(format!(
                    "unexpected response status '{other}'"
                )));
            }
            None => {
                return Err(AppError::Provider(
                    "response is missing a status".to_string(),
                ));
            }
        }

        let output = body
            .get("output")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::Provider("response has no output".to_string()))?;
        let message = output
            .iter()
            .find(|item| item.get("type").and_then(Value::as_str) == Some("message"))
            .ok_or_else(|| AppError::Provider("response has no message output".to_string()))?;
        let block = message
            .get("content")
            .and_then(Value::as_array)
            .and_then(|content| {
                content
                    .iter()
                    .find(|block| block.get("type").and_then(Value::as_str) == Some("output_text"))
            })
            .ok_or_else(|| AppError::Provider("message has no output_text content".to_string()))?;

        block
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::Provider("output_text block has no text".to_string()))
    }
}
