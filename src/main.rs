mod cmd;
mod context;
mod workflow;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use triage::config::{AppConfig, OnError};
use triage::error::AppResult;

use crate::cmd::classify::{self as classify_cmd, ClassifyArgs};
use crate::cmd::config::{self as config_cmd, ConfigArgs};

#[derive(Parser)]
#[command(name = "triage", author, version, about = "AI support ticket classifier")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a ticket against a schema and print the result as JSON.
    Classify(ClassifyArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (on_error, outcome) = match cli.command {
        Commands::Config(args) => (OnError::Log, config_cmd::run(args.command)),
        Commands::Classify(args) => match AppConfig::load() {
            Ok(config) => (config.on_error, run_classify(config, args).await),
            Err(error) => (OnError::Log, Err(error)),
        },
    };

    if let Err(error) = outcome {
        if on_error == OnError::Log {
            tracing::error!("{error}");
        }
        std::process::exit(1);
    }
}

async fn run_classify(config: AppConfig, args: ClassifyArgs) -> AppResult<()> {
    let outcome = classify_cmd::run(config, args).await?;

    if outcome.result.is_empty() {
        tracing::warn!("model returned no usable classification");
    } else if !outcome.unresolved_fields.is_empty() {
        tracing::info!(fields = ?outcome.unresolved_fields, "custom fields left unset");
    }
    let rendered =
        serde_json::to_string_pretty(&outcome.result).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}
