//! # Configuration Utilities
//!
//! Shared configuration structures used by both the relay server and the
//! challenge rotation job.
//!
//! Non-secret settings live in TOML files; credentials are read from the
//! process environment at startup (see [`Secrets`]).

use anyhow::{Context, Result};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
///
/// # Example
/// ```ignore
/// let config: RelayConfig = load_config("config/relay.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read config {}", path))?;
    let config: T =
        toml::from_str(&content).with_context(|| format!("failed to parse config {}", path))?;
    Ok(config)
}

// ============================================================================
// RELAY SERVER CONFIGURATION
// ============================================================================

/// Complete relay configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerInfo,
    #[serde(default)]
    pub scanning: ScanningConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

/// Where the relay listens and which browser origin may open scanning sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Listen address (e.g., "0.0.0.0:5001")
    #[serde(default = "default_address")]
    pub address: String,
    /// Origin allowed on the WebSocket upgrade; `*` allows any origin
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            address: default_address(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

/// Scanning policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanningConfig {
    /// How long a connection stays in cooldown after a detection (milliseconds)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

/// Settings for the upstream text-completion service used by `/analyze_product`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Chat-completions endpoint (OpenAI-compatible)
    #[serde(default = "default_completion_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Connect + read timeout for one completion request (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            url: default_completion_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_address() -> String {
    "0.0.0.0:5001".to_string()
}

fn default_allowed_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_cooldown_ms() -> u64 {
    1000
}

fn default_completion_url() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    1.0
}

fn default_timeout_secs() -> u64 {
    20
}

// ============================================================================
// ROTATION JOB CONFIGURATION
// ============================================================================

/// Configuration for the weekly challenge rotation job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RotationConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Weekly firing time, in local time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Day of week, e.g. "Sun" or "sunday"
    #[serde(default = "default_weekday")]
    pub weekday: String,
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            weekday: default_weekday(),
            hour: 0,
            minute: 0,
        }
    }
}

impl ScheduleConfig {
    /// Parse the configured day of week.
    pub fn weekday(&self) -> Result<Weekday> {
        self.weekday
            .parse::<Weekday>()
            .map_err(|_| anyhow::anyhow!("invalid weekday in schedule: {}", self.weekday))
    }
}

fn default_weekday() -> String {
    "Sun".to_string()
}

/// Location of the static challenge pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_pool_path")]
    pub path: PathBuf,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            path: default_pool_path(),
        }
    }
}

fn default_pool_path() -> PathBuf {
    PathBuf::from("weekly_challenges.json")
}

// ============================================================================
// SECRETS
// ============================================================================

/// Remote store location and credentials.
#[derive(Debug, Clone)]
pub struct StoreSecrets {
    pub url: String,
    pub api_key: String,
}

impl StoreSecrets {
    /// Read `SUPABASE_URL` and `SUPABASE_API_KEY`. Missing keys abort startup.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: required_var("SUPABASE_URL")?,
            api_key: required_var("SUPABASE_API_KEY")?,
        })
    }
}

/// API key for the completion service (`GROQ_API_KEY`).
pub fn completion_api_key() -> Result<String> {
    required_var("GROQ_API_KEY")
}

fn required_var(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("environment variable {} is not set", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_relay_config_uses_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.address, "0.0.0.0:5001");
        assert_eq!(config.server.allowed_origin, "http://localhost:5173");
        assert_eq!(config.scanning.cooldown_ms, 1000);
        assert_eq!(config.completion.max_tokens, 500);
        assert_eq!(config.completion.timeout_secs, 20);
    }

    #[test]
    fn test_load_relay_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\naddress = \"127.0.0.1:9000\"\n\n[scanning]\ncooldown_ms = 250"
        )
        .unwrap();

        let config: RelayConfig = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.address, "127.0.0.1:9000");
        assert_eq!(config.scanning.cooldown_ms, 250);
        assert_eq!(config.completion.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let result: Result<RelayConfig> = load_config("/nonexistent/relay.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_schedule_weekday_parsing() {
        let config: RotationConfig =
            toml::from_str("[schedule]\nweekday = \"wednesday\"\nhour = 6").unwrap();
        assert_eq!(config.schedule.weekday().unwrap(), Weekday::Wed);
        assert_eq!(config.schedule.hour, 6);

        let default = RotationConfig::default();
        assert_eq!(default.schedule.weekday().unwrap(), Weekday::Sun);
        assert_eq!(default.pool.path, PathBuf::from("weekly_challenges.json"));

        let bad = ScheduleConfig {
            weekday: "someday".to_string(),
            hour: 0,
            minute: 0,
        };
        assert!(bad.weekday().is_err());
    }
}
