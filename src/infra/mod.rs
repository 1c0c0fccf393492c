pub mod anthropic;
pub mod http;
pub mod llm;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use llm::AiClassifier;
pub use openai::OpenAiProvider;
