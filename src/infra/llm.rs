use async_trait::async_trait;

use crate::config::RequestConfig;
use crate::domain::classification::ClassificationResult;
use crate::domain::schema::ClassificationSchema;
use crate::error::AppResult;
use crate::infra::http;
use crate::prompt::build_prompt;
use crate::services::TicketClassifier;
use crate::validate::validate_response;

/// Classifies tickets with one call to the configured AI provider.
pub struct AiClassifier {
    config: RequestConfig,
}

impl AiClassifier {
    pub fn new(config: RequestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }
}

#[async_trait]
impl TicketClassifier for AiClassifier {
    async fn classify(
        &self,
        content: &str,
        schema: &ClassificationSchema,
    ) -> AppResult<ClassificationResult> {
        self.config.validate()?;
        let prompt = build_prompt(content, schema);
        let raw = http::send(&self.config, &prompt).await?;
        let result = validate_response(&raw, schema)?;
        tracing::debug!(
            topic_id = ?result.topic_id,
            priority_id = ?result.priority_id,
            custom_fields = result.custom_fields.len(),
            "classification validated"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::config::Provider;
    use crate::domain::classification::FieldValue;
    use crate::domain::schema::FieldDefinition;
    use crate::error::AppError;

    /// Serves a single canned HTTP response and hands back the raw request.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let read = socket.read(&mut buf).await.unwrap();
                if read == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..read]);
                if request_complete(&received) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&received).into_owned()
        });

        (base_url, handle)
    }

    fn request_complete(received: &[u8]) -> bool {
        let text = String::from_utf8_lossy(received);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        received.len() >= header_end + 4 + content_length
    }

    fn schema() -> ClassificationSchema {
        ClassificationSchema::new()
            .with_topic(1, "Billing")
            .with_priority(2, "High")
            .with_field(
                "risk",
                FieldDefinition::choices("Risk", [("lo", "Low Risk"), ("hi", "High Risk")], false),
            )
    }

    fn config(provider: Provider, base_url: String) -> RequestConfig {
        let mut config = RequestConfig::new(provider, "secret-key");
        config.base_url = Some(base_url);
        config.timeout_seconds = 5;
        config
    }

    #[tokio::test]
    async fn classifies_through_openai_envelope() {
        let reply = "```json\n{\"topic_id\": 1, \"priority_id\": 9, \"custom_fields\": {\"risk\": \"High Risk\", \"ghost_field\": \"x\"}}\n```";
        let body = json!({
            "status": "completed",
            "output": [{"type": "message", "content": [{"type": "output_text", "text": reply}]}]
        })
        .to_string();
        let (base_url, server) = serve_once("200 OK", body).await;

        let classifier = AiClassifier::new(config(Provider::OpenAi, base_url));
        let result = classifier
            .classify("Subject: Refund\n\nI was charged twice.", &schema())
            .await
            .unwrap();

        assert_eq!(result.topic_id, Some(1));
        assert_eq!(result.priority_id, None);
        assert_eq!(result.custom_fields.len(), 1);
        assert_eq!(
            result.custom_fields.get("risk"),
            Some(&FieldValue::Choice("hi".to_string()))
        );

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /v1/responses"));
        assert!(request.contains("authorization: bearer secret-key"));
        assert!(!request.contains("x-api-key"));
        assert!(request.contains("i was charged twice."));
    }

    #[tokio::test]
    async fn classifies_through_anthropic_envelope() {
        let body = json!({
            "type": "message",
            "content": [{"type": "text", "text": "{\"topic_id\": 1, \"priority_id\": 2}"}]
        })
        .to_string();
        let (base_url, server) = serve_once("200 OK", body).await;

        let classifier = AiClassifier::new(config(Provider::Anthropic, base_url));
        let result = classifier.classify("Printer jammed", &schema()).await.unwrap();
        assert_eq!(result.topic_id, Some(1));
        assert_eq!(result.priority_id, Some(2));

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /v1/messages"));
        assert!(request.contains("x-api-key: secret-key"));
        assert!(request.contains("anthropic-version: 2023-06-01"));
        assert!(!request.contains("authorization: bearer"));
    }

    #[tokio::test]
    async fn surfaces_http_errors_with_provider_message() {
        let body = json!({"error": {"type": "authentication_error", "message": "invalid x-api-key"}})
            .to_string();
        let (base_url, _server) = serve_once("401 Unauthorized", body).await;

        let classifier = AiClassifier::new(config(Provider::Anthropic, base_url));
        let err = classifier.classify("hello", &schema()).await.unwrap_err();
        match err {
            AppError::Provider(message) => {
                assert!(message.contains("401"));
                assert!(message.contains("invalid x-api-key"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn surfaces_unparseable_reply_as_parse_error() {
        let body = json!({
            "content": [{"type": "text", "text": "Sure, here's the classification: Billing"}]
        })
        .to_string();
        let (base_url, _server) = serve_once("200 OK", body).await;

        let classifier = AiClassifier::new(config(Provider::Anthropic, base_url));
        let err = classifier.classify("hello", &schema()).await.unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
    }

    #[tokio::test]
    async fn rejects_malformed_envelope() {
        let (base_url, _server) = serve_once("200 OK", "<html>gateway</html>".to_string()).await;

        let classifier = AiClassifier::new(config(Provider::OpenAi, base_url));
        let err = classifier.classify("hello", &schema()).await.unwrap_err();
        assert!(err.is_provider_error(), "{err}");
    }

    #[tokio::test]
    async fn reports_unanswered_request_as_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        });

        let mut config = config(Provider::OpenAi, base_url);
        config.timeout_seconds = 1;
        let err = AiClassifier::new(config)
            .classify("hello", &schema())
            .await
            .unwrap_err();
        match err {
            AppError::Transport(message) => assert!(message.contains("timed out"), "{message}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn fails_fast_without_api_key() {
        let classifier = AiClassifier::new(RequestConfig::new(Provider::OpenAi, ""));
        let err = classifier.classify("hello", &schema()).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
