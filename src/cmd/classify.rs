use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;

use triage::config::{AppConfig, Provider};
use triage::domain::schema::ClassificationSchema;
use triage::domain::ticket::TicketContent;
use triage::error::{AppError, AppResult};
use triage::infra::llm::AiClassifier;

use crate::context::AppContext;
use crate::workflow::classify::{ClassifyOutcome, classify_ticket};

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// JSON file describing the topics, priorities and custom fields to choose from.
    #[arg(short, long)]
    pub schema: PathBuf,
    /// Ticket subject line.
    #[arg(long, default_value = "")]
    pub subject: String,
    /// File holding the plain-text ticket body; read from stdin when omitted.
    #[arg(short, long)]
    pub body: Option<PathBuf>,
    /// Override the configured provider (openai or anthropic).
    #[arg(short, long)]
    pub provider: Option<Provider>,
    /// Override the configured model.
    #[arg(short, long)]
    pub model: Option<String>,
}

pub async fn run(config: AppConfig, args: ClassifyArgs) -> AppResult<ClassifyOutcome> {
    let schema = load_schema(&args.schema)?;
    let body = match &args.body {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let ticket = TicketContent::new(args.subject, body);
    if ticket.is_empty() {
        return Err(AppError::Configuration(
            "ticket has neither subject nor body".to_string(),
        ));
    }

    let mut request = config.request_config(args.provider);
    if let Some(model) = args.model.filter(|m| !m.trim().is_empty()) {
        request.model = model;
    }
    request.validate()?;

    let classifier = AiClassifier::new(request);
    tracing::info!(
        provider = %classifier.config().provider,
        model = %classifier.config().model,
        "classifying ticket"
    );
    let context = AppContext::new(Arc::new(classifier));
    classify_ticket(&context, &ticket, &schema).await
}

pub fn load_schema(path: &Path) -> AppResult<ClassificationSchema> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|err| {
        AppError::Configuration(format!("invalid schema file {}: {err}", path.display()))
    })
}
