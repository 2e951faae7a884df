use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            fetch: FetchConfig::default(),
            output: OutputConfig::default(),
            log_level: default_log_level(),
        }
    }
}

/// API endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the platform, scheme and host only. Required; settable
    /// here, via SOLMAP_BASE_URL, or with the --base-url flag.
    pub base_url: String,
    /// Environment variable holding the API token.
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("SOLMAP_BASE_URL").unwrap_or_default(),
            token_env: "SOLMAP_TOKEN".to_string(),
        }
    }
}

/// Fetch-layer tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum concurrent definition fetches.
    pub max_concurrent: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            timeout_secs: 30,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory generated files land in (CLI --output overrides).
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("solution-map"),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration.
    ///
    /// Loads environment variables from .env (if present) first. Looks for
    /// the config file in this order:
    /// 1. Path specified in the SOLMAP_CONFIG environment variable
    /// 2. ./config.toml in the current directory
    ///
    /// A missing file is not an error: the tool is flag-driven, so
    /// defaults apply and the CLI fills in the rest.
    pub fn load() -> Result<Self> {
        // Optional .env file; ignore errors
        let _ = dotenv::dotenv();

        let config_path = std::env::var("SOLMAP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    /// Validate configuration values. Called after CLI overrides are
    /// applied.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            anyhow::bail!(
                "api.base_url is not set. Provide --base-url, set SOLMAP_BASE_URL, or add it to config.toml."
            );
        }

        Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a valid URL: {}", self.api.base_url))?;

        if self.fetch.max_concurrent == 0 {
            anyhow::bail!("fetch.max_concurrent must be greater than 0");
        }

        if self.fetch.timeout_secs == 0 {
            anyhow::bail!("fetch.timeout_secs must be greater than 0");
        }

        Ok(())
    }
}
