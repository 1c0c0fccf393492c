//! Classifies support tickets with an external AI provider and validates the
//! reply against the schema of topics, priorities and custom fields the host
//! allows.

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod prompt;
pub mod services;
pub mod validate;

pub use config::{Provider, RequestConfig};
pub use domain::{
    ChoiceOption, ClassificationResult, ClassificationSchema, FieldDefinition, FieldValue,
    TicketContent,
};
pub use error::{AppError, AppResult};
pub use infra::AiClassifier;
pub use services::TicketClassifier;

/// Classifies `content` against `schema` with a single provider call.
pub async fn classify(
    content: &str,
    schema: &ClassificationSchema,
    config: &RequestConfig,
) -> AppResult<ClassificationResult> {
    AiClassifier::new(config.clone())
        .classify(content, schema)
        .await
}
