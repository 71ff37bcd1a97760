//! TaskDecomposer configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main TaskDecomposer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat-completion endpoint configuration
    pub llm: LlmConfig,

    /// Retry/backoff policy for remote calls
    pub retry: RetryConfig,

    /// Where project state is kept
    pub storage: StorageConfig,

    /// Periodic save settings
    pub autosave: AutosaveConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key environment variable is set.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .taskdecomposer.yml
        let local_config = PathBuf::from(".taskdecomposer.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/taskdecomposer/taskdecomposer.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskdecomposer").join("taskdecomposer.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialized
    ///
    /// Errors are swallowed: a broken config file is reported later by `load`.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".taskdecomposer.yml")];
                if let Some(config_dir) = dirs::config_dir() {
                    paths.push(config_dir.join("taskdecomposer").join("taskdecomposer.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Chat-completion endpoint configuration
///
/// Generation parameters are fixed per deployment and sent with every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the chat-completions endpoint under the base URL
    pub path: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Nucleus sampling cutoff
    #[serde(rename = "top-p")]
    pub top_p: f32,

    #[serde(rename = "frequency-penalty")]
    pub frequency_penalty: f32,

    #[serde(rename = "presence-penalty")]
    pub presence_penalty: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            path: "/v1/chat/completions".to_string(),
            model: "deepseek-chat".to_string(),
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            top_p: 0.95,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Full endpoint URL
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }

    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).context(format!("Environment variable {} is not set", self.api_key_env))
    }
}

/// Retry/backoff policy for remote calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the key-value state files
    #[serde(rename = "state-dir")]
    pub state_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/taskdecomposer on Linux)
        let state_dir = dirs::data_dir()
            .map(|d| d.join("taskdecomposer"))
            .unwrap_or_else(|| PathBuf::from(".taskdecomposer"));

        Self { state_dir }
    }
}

/// Periodic save settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Seconds between automatic saves
    #[serde(rename = "interval-secs")]
    pub interval_secs: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl AutosaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}
