use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::RequestConfig;
use crate::domain::classification::ClassificationResult;
use crate::domain::schema::ClassificationSchema;
use crate::error::AppResult;
use crate::prompt::Prompt;

/// A fully specified outbound call, built before anything touches the network.
#[derive(Clone, PartialEq)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

impl ProviderRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

const SECRET_HEADERS: &[&str] = &["authorization", "x-api-key"];

impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| {
                if SECRET_HEADERS.iter().any(|secret| name.eq_ignore_ascii_case(secret)) {
                    (*name, "<redacted>")
                } else {
                    (*name, value.as_str())
                }
            })
            .collect::<Vec<_>>();
        f.debug_struct("ProviderRequest")
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// One of the supported AI HTTP APIs. Implementations differ in payload shape,
/// auth header and envelope, but agree on producing the assistant's raw text.
pub trait LanguageModelProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn build_request(&self, config: &RequestConfig, prompt: &Prompt) -> ProviderRequest;

    /// Pulls the assistant text out of a successful (2xx) response body.
    fn extract_text(&self, body: &Value) -> AppResult<String>;
}

#[async_trait]
pub trait TicketClassifier: Send + Sync {
    async fn classify(
        &self,
        content: &str,
        schema: &ClassificationSchema,
    ) -> AppResult<ClassificationResult>;
}

/// `error.message` from a provider error envelope, when present.
pub fn envelope_error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    if error.is_null() {
        return None;
    }
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| error.as_str().map(str::to_string))
        .unwrap_or_else(|| error.to_string());
    Some(message)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_error_message_from_envelope() {
        let body = json!({"error": {"type": "invalid_request_error", "message": "bad model"}});
        assert_eq!(envelope_error_message(&body).as_deref(), Some("bad model"));
    }

    #[test]
    fn ignores_null_error() {
        assert_eq!(envelope_error_message(&json!({"error": null, "status": "completed"})), None);
        assert_eq!(envelope_error_message(&json!({"content": []})), None);
    }

    #[test]
    fn finds_headers_case_insensitively() {
        let request = ProviderRequest {
            url: "https://example.invalid".to_string(),
            headers: vec![("x-api-key", "k".to_string())],
            body: json!({}),
        };
        assert_eq!(request.header("X-API-KEY"), Some("k"));
        assert_eq!(request.header("authorization"), None);
    }

    #[test]
    fn debug_output_hides_auth_headers() {
        let request = ProviderRequest {
            url: "https://example.invalid".to_string(),
            headers: vec![
                ("authorization", "Bearer sk-very-secret".to_string()),
                ("x-api-key", "ak-very-secret".to_string()),
                ("anthropic-version", "2023-06-01".to_string()),
            ],
            body: json!({"model": "m"}),
        };
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("2023-06-01"));
    }
}
