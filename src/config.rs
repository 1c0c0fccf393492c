use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const CONFIG_DIR_NAME: &str = "triage";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
pub const DEFAULT_NO_TEMPERATURE_PREFIXES: &[&str] = &["o1", "o3", "o4", "gpt-5"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Anthropic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(AppError::Configuration(format!(
                "unknown provider '{other}' (expected openai or anthropic)"
            ))),
        }
    }
}

/// Everything one provider call needs. Built per call; nothing is cached.
#[derive(Clone)]
pub struct RequestConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub temperature: f64,
    pub max_output_tokens: u32,
    /// OpenAI only: whether the provider may keep the response.
    pub store: Option<bool>,
    /// Model-name prefixes of models that reject the temperature parameter.
    pub no_temperature_prefixes: Vec<String>,
    /// Replaces the provider's default API origin.
    pub base_url: Option<String>,
}

impl RequestConfig {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: provider.default_model().to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            store: None,
            no_temperature_prefixes: default_no_temperature_prefixes(),
            base_url: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Fails with a configuration error before any network traffic happens.
    pub fn validate(&self) -> AppResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "{} API key not configured",
                self.provider
            )));
        }
        if self.model.trim().is_empty() {
            return Err(AppError::Configuration("model not configured".to_string()));
        }
        if self.timeout_seconds == 0 {
            return Err(AppError::Configuration(
                "timeout must be a positive number of seconds".to_string(),
            ));
        }
        if self.max_output_tokens == 0 {
            return Err(AppError::Configuration(
                "max output tokens must be positive".to_string(),
            ));
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Configuration(format!(
                "temperature {} is outside 0-2",
                self.temperature
            )));
        }
        Ok(())
    }

    /// Reasoning-tier models reject the parameter outright, so it is left out
    /// of the request entirely for them.
    pub fn supports_temperature(&self) -> bool {
        let model = self.model.trim().to_lowercase();
        !self
            .no_temperature_prefixes
            .iter()
            .map(|prefix| prefix.trim().to_lowercase())
            .any(|prefix| !prefix.is_empty() && model.starts_with(&prefix))
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("store", &self.store)
            .field("no_temperature_prefixes", &self.no_temperature_prefixes)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_no_temperature_prefixes() -> Vec<String> {
    DEFAULT_NO_TEMPERATURE_PREFIXES
        .iter()
        .map(|prefix| prefix.to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    #[default]
    Log,
    Silent,
}

impl OnError {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnError::Log => "log",
            OnError::Silent => "silent",
        }
    }
}

impl FromStr for OnError {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "log" => Ok(OnError::Log),
            "silent" => Ok(OnError::Silent),
            other => Err(AppError::Configuration(format!(
                "unknown error policy '{other}' (expected log or silent)"
            ))),
        }
    }
}

/// Plugin settings as persisted in the settings file. Every field is optional
/// so a partially filled file still loads.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    pub provider: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_store: Option<bool>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub no_temperature_prefixes: Option<Vec<String>>,
    pub base_url: Option<String>,
    pub on_error: Option<String>,
}

impl fmt::Debug for StoredConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("StoredConfig")
            .field("provider", &self.provider)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_model", &self.openai_model)
            .field("openai_store", &self.openai_store)
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("anthropic_model", &self.anthropic_model)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("no_temperature_prefixes", &self.no_temperature_prefixes)
            .field("base_url", &self.base_url)
            .field("on_error", &self.on_error)
            .finish()
    }
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = toml::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

/// Resolved settings: the stored file with environment overrides applied.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub stored: StoredConfig,
    pub provider: Provider,
    pub on_error: OnError,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_stored(StoredConfig::load()?)
    }

    pub fn from_stored(mut stored: StoredConfig) -> AppResult<Self> {
        apply_env_overrides(&mut stored);
        let provider = stored
            .provider
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(Provider::from_str)
            .transpose()?
            .unwrap_or_default();
        let on_error = stored
            .on_error
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(OnError::from_str)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            stored,
            provider,
            on_error,
        })
    }

    /// Builds the per-call request settings for `provider` (or the configured one).
    pub fn request_config(&self, provider: Option<Provider>) -> RequestConfig {
        let provider = provider.unwrap_or(self.provider);
        let stored = &self.stored;
        let (api_key, model) = match provider {
            Provider::OpenAi => (&stored.openai_api_key, &stored.openai_model),
            Provider::Anthropic => (&stored.anthropic_api_key, &stored.anthropic_model),
        };

        let mut config = RequestConfig::new(provider, api_key.clone().unwrap_or_default());
        if let Some(model) = model.as_deref().filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(timeout) = stored.timeout_seconds {
            config.timeout_seconds = timeout;
        }
        if let Some(temperature) = stored.temperature {
            config.temperature = temperature;
        }
        if let Some(tokens) = stored.max_output_tokens {
            config.max_output_tokens = tokens;
        }
        if let Some(prefixes) = &stored.no_temperature_prefixes {
            config.no_temperature_prefixes = prefixes.clone();
        }
        if provider == Provider::OpenAi {
            config.store = stored.openai_store;
        }
        config.base_url = stored
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty());
        config
    }
}

fn apply_env_overrides(stored: &mut StoredConfig) {
    if let Some(provider) = env_value("TRIAGE_PROVIDER") {
        stored.provider = Some(provider);
    }
    let provider = stored
        .provider
        .as_deref()
        .and_then(|value| Provider::from_str(value).ok())
        .unwrap_or_default();
    let (key_slot, model_slot) = match provider {
        Provider::OpenAi => (&mut stored.openai_api_key, &mut stored.openai_model),
        Provider::Anthropic => (&mut stored.anthropic_api_key, &mut stored.anthropic_model),
    };
    if let Some(key) = env_value("TRIAGE_API_KEY") {
        *key_slot = Some(key);
    }
    if let Some(model) = env_value("TRIAGE_MODEL") {
        *model_slot = Some(model);
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| {
            AppError::Configuration("could not determine the user config directory".to_string())
        })
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}
