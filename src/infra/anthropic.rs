use serde_json::{Value, json};

use crate::config::RequestConfig;
use crate::error::{AppError, AppResult};
use crate::prompt::Prompt;
use crate::services::language_model::{
    LanguageModelProvider, ProviderRequest, envelope_error_message,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages endpoint.
pub struct AnthropicProvider;

impl AnthropicProvider {
    pub fn new() -> Self {
        Self
    }

    fn endpoint(base_url: Option<&str>) -> String {
        format!(
            "{}/v1/messages",
            base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/')
        )
    }
}

impl Default for AnthropicProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageModelProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn build_request(&self, config: &RequestConfig, prompt: &Prompt) -> ProviderRequest {
        let body = json!({
            "model": config.model,
            "max_tokens": config.max_output_tokens,
            "system": prompt.system,
            "messages": [{"role": "user", "content": prompt.user}],
            "temperature": config.temperature,
        });

        ProviderRequest {
            url: Self::endpoint(config.base_url.as_deref()),
            headers: vec![
                ("x-api-key", config.api_key.clone()),
                ("anthropic-version", ANTHROPIC_VERSION.to_string()),
            ],
            body,
        }
    }

    fn extract_text(&self, body: &Value) -> AppResult<String> {
        if let Some(message) = envelope_error_message(body) {
            return Err(AppError::Provider(message));
        }

        body.pointer("/content/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::Provider("response has no text content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::Provider;

    fn prompt() -> Prompt {
        Prompt {
            system: "system text".to_string(),
            user: "user text".to_string(),
        }
    }

    #[test]
    fn builds_messages_payload() {
        let mut config = RequestConfig::new(Provider::Anthropic, "ak-test");
        config.max_output_tokens = 512;
        config.temperature = 0.25;

        let request = AnthropicProvider::new().build_request(&config, &prompt());

        assert_eq!(request.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(request.header("x-api-key"), Some("ak-test"));
        assert_eq!(request.header("anthropic-version"), Some(ANTHROPIC_VERSION));
        assert_eq!(request.header("authorization"), None);
        assert_eq!(
            request.body,
            json!({
                "model": "claude-3-5-haiku-latest",
                "max_tokens": 512,
                "system": "system text",
                "messages": [{"role": "user", "content": "user text"}],
                "temperature": 0.25
            })
        );
    }

    #[test]
    fn keeps_temperature_for_every_model() {
        let config = RequestConfig::new(Provider::Anthropic, "ak-test").with_model("o1-lookalike");
        let request = AnthropicProvider::new().build_request(&config, &prompt());
        assert!(request.body.get("temperature").is_some());
        assert!(request.body.get("store").is_none());
    }

    #[test]
    fn extracts_first_content_block_text() {
        let body = json!({
            "type": "message",
            "content": [{"type": "text", "text": "{\"priority_id\": 2}"}],
            "stop_reason": "end_turn"
        });
        assert_eq!(
            AnthropicProvider::new().extract_text(&body).unwrap(),
            "{\"priority_id\": 2}"
        );
    }

    #[test]
    fn reports_error_envelope() {
        let body = json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}});
        let err = AnthropicProvider::new().extract_text(&body).unwrap_err();
        assert!(matches!(err, AppError::Provider(msg) if msg == "Overloaded"));
    }

    #[test]
    fn rejects_missing_content() {
        let provider = AnthropicProvider::new();
        assert!(provider.extract_text(&json!({"content": []})).is_err());
        assert!(provider.extract_text(&json!({"content": [{"type": "tool_use"}]})).is_err());
        assert!(provider.extract_text(&json!({})).is_err());
    }
}
