//! Startup configuration loading and validation for banter.
//!
//! Loads configuration from `~/.banter/config.toml` with environment
//! variable overrides, and validates everything once at process start.
//! Runtime-mutable settings (personality, reply chance, model id) live in
//! the record store, not here; this crate only seeds them via `banter init`
//! and carries the process-level knobs that never change while running.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root startup configuration.
///
/// Maps directly to `~/.banter/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat platform bot token (env: BANTER_DISCORD_TOKEN, DISCORD_TOKEN)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord_token: Option<String>,

    /// Model provider API key (env: BANTER_API_KEY, GROQ_API_KEY, OPENAI_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completions API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Path to the SQLite record store
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Agent runtime knobs
    #[serde(default)]
    pub agent: AgentConfig,

    /// Admin dashboard settings
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Values seeded into the record store by `banter init`
    #[serde(default)]
    pub seed: SeedConfig,
}

fn default_api_url() -> String {
    "https://api.groq.com/openai/v1".into()
}

fn default_db_path() -> String {
    AppConfig::config_dir()
        .join("banter.db")
        .to_string_lossy()
        .into_owned()
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("discord_token", &redact(&self.discord_token))
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("db_path", &self.db_path)
            .field("agent", &self.agent)
            .field("dashboard", &self.dashboard)
            .field("seed", &self.seed)
            .finish()
    }
}

/// Process-level agent knobs. None of these are mutable at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Rolling history window size per channel (turn strings kept)
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Sampling temperature passed to the provider
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Remote model call timeout in seconds
    #[serde(default = "default_model_timeout")]
    pub model_timeout_secs: u64,

    /// Web lookup timeout in seconds
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,

    /// Whether the web lookup collaborator is wired in at all
    #[serde(default = "default_true")]
    pub lookup_enabled: bool,
}

fn default_history_window() -> usize {
    5
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_model_timeout() -> u64 {
    30
}
fn default_lookup_timeout() -> u64 {
    5
}
fn default_true() -> bool {
    true
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            model_timeout_secs: default_model_timeout(),
            lookup_timeout_secs: default_lookup_timeout(),
            lookup_enabled: true,
        }
    }
}

/// Admin dashboard settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Required. There is deliberately no default password
    /// (env: BANTER_ADMIN_PASSWORD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5000
}

impl std::fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("admin_password", &redact(&self.admin_password))
            .finish()
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_password: None,
        }
    }
}

/// Initial record-store values written by `banter init`.
///
/// After seeding, these are owned by the store and mutated only through the
/// dashboard; editing this file has no effect on a seeded database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_personality")]
    pub personality: String,

    #[serde(default = "default_reply_chance")]
    pub reply_chance: f64,

    #[serde(default = "default_model_id")]
    pub model_id: String,
}

fn default_personality() -> String {
    "You are a friendly, slightly sarcastic chat companion. Keep replies short \
     and conversational."
        .into()
}
fn default_reply_chance() -> f64 {
    0.05
}
fn default_model_id() -> String {
    "llama3-70b-8192".into()
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            personality: default_personality(),
            reply_chance: default_reply_chance(),
            model_id: default_model_id(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.banter/config.toml).
    ///
    /// Environment variables take priority over file values:
    /// - `BANTER_DISCORD_TOKEN`, then `DISCORD_TOKEN`
    /// - `BANTER_API_KEY`, then `GROQ_API_KEY`, then `OPENAI_API_KEY`
    /// - `BANTER_ADMIN_PASSWORD`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(token) = std::env::var("BANTER_DISCORD_TOKEN")
            .or_else(|_| std::env::var("DISCORD_TOKEN"))
        {
            config.discord_token = Some(token);
        }

        if let Ok(key) = std::env::var("BANTER_API_KEY")
            .or_else(|_| std::env::var("GROQ_API_KEY"))
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
        {
            config.api_key = Some(key);
        }

        if let Ok(password) = std::env::var("BANTER_ADMIN_PASSWORD") {
            config.dashboard.admin_password = Some(password);
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".banter")
    }

    /// Structural validation, applied on every load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.seed.reply_chance) {
            return Err(ConfigError::ValidationError(
                "seed.reply_chance must be a probability in [0,1]".into(),
            ));
        }

        if self.agent.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "agent.history_window must be at least 1".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::ValidationError(
                "agent.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        Ok(())
    }

    /// Credential validation for `banter run` — fails fast with a clear
    /// diagnostic instead of starting with an insecure or absent value.
    pub fn validate_for_run(&self) -> Result<(), ConfigError> {
        if self.discord_token.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::ValidationError(
                "no chat platform token configured — set discord_token in config.toml \
                 or the BANTER_DISCORD_TOKEN environment variable"
                    .into(),
            ));
        }

        if self.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::ValidationError(
                "no provider API key configured — set api_key in config.toml or the \
                 BANTER_API_KEY environment variable"
                    .into(),
            ));
        }

        if self
            .dashboard
            .admin_password
            .as_deref()
            .is_none_or(str::is_empty)
        {
            return Err(ConfigError::ValidationError(
                "no dashboard admin password configured — set dashboard.admin_password \
                 or the BANTER_ADMIN_PASSWORD environment variable; there is no default"
                    .into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `banter init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discord_token: None,
            api_key: None,
            api_url: default_api_url(),
            db_path: default_db_path(),
            agent: AgentConfig::default(),
            dashboard: DashboardConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
