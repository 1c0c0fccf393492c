use std::io::{self, Write};

use clap::{Args, Subcommand};

use triage::config::{StoredConfig, config_file_path};
use triage::error::{AppError, AppResult};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring triage.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("API keys are stored in the local config file; protect your filesystem accordingly.");
    println!();

    apply_prompt("Provider (openai/anthropic)", &mut cfg.provider, false)?;
    apply_prompt("OpenAI API key", &mut cfg.openai_api_key, true)?;
    apply_prompt("OpenAI model", &mut cfg.openai_model, false)?;
    apply_parsed_prompt("Store OpenAI responses (true/false)", &mut cfg.openai_store)?;
    apply_prompt("Anthropic API key", &mut cfg.anthropic_api_key, true)?;
    apply_prompt("Anthropic model", &mut cfg.anthropic_model, false)?;
    apply_parsed_prompt("Request timeout in seconds", &mut cfg.timeout_seconds)?;
    apply_parsed_prompt("Temperature (0-2)", &mut cfg.temperature)?;
    apply_parsed_prompt("Max output tokens", &mut cfg.max_output_tokens)?;
    apply_prompt("API base URL override", &mut cfg.base_url, false)?;
    apply_prompt("On error (log/silent)", &mut cfg.on_error, false)?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("Provider: {}", display_value(&cfg.provider));
    println!("OpenAI API key: {}", mask_secret(&cfg.openai_api_key));
    println!("OpenAI model: {}", display_value(&cfg.openai_model));
    println!("Store OpenAI responses: {}", display_parsed(&cfg.openai_store));
    println!("Anthropic API key: {}", mask_secret(&cfg.anthropic_api_key));
    println!("Anthropic model: {}", display_value(&cfg.anthropic_model));
    println!("Timeout (s): {}", display_parsed(&cfg.timeout_seconds));
    println!("Temperature: {}", display_parsed(&cfg.temperature));
    println!("Max output tokens: {}", display_parsed(&cfg.max_output_tokens));
    println!(
        "No-temperature model prefixes: {}",
        cfg.no_temperature_prefixes
            .as_ref()
            .map(|prefixes| prefixes.join(", "))
            .unwrap_or_else(|| "<default>".to_string())
    );
    println!("API base URL: {}", display_value(&cfg.base_url));
    println!("On error: {}", display_value(&cfg.on_error));

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    match prompt(field, target.as_deref(), secret)? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn apply_parsed_prompt<T>(field: &str, target: &mut Option<T>) -> AppResult<()>
where
    T: std::str::FromStr + ToString,
{
    let current = target.as_ref().map(ToString::to_string);
    match prompt(field, current.as_deref(), false)? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => {
            let parsed = value
                .parse()
                .map_err(|_| AppError::Configuration(format!("invalid value for {field}: {value}")))?;
            *target = Some(parsed);
        }
    }
    Ok(())
}

fn prompt(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(parse_action(&input))
}

fn parse_action(input: &str) -> PromptAction {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        PromptAction::Keep
    } else if trimmed == "-" {
        PromptAction::Clear
    } else {
        PromptAction::Set(trimmed.to_string())
    }
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn display_parsed<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "<default>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let prefix = token.chars().take(3).collect::<String>();
            let suffix = token
                .chars()
                .rev()
                .take(3)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<String>();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

#[derive(Debug, PartialEq)]
enum PromptAction {
    Keep,
    Clear,
    Set(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_secrets() {
        assert_eq!(mask_secret(&Some("sk-abcdef123456".to_string())), "sk-***456");
        assert_eq!(mask_secret(&Some("short".to_string())), "***");
        assert_eq!(mask_secret(&None), "<not set>");
    }

    #[test]
    fn interprets_prompt_input() {
        assert_eq!(parse_action("\n"), PromptAction::Keep);
        assert_eq!(parse_action(" - \n"), PromptAction::Clear);
        assert_eq!(
            parse_action(" anthropic\n"),
            PromptAction::Set("anthropic".to_string())
        );
    }
}
