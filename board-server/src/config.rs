use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub sheet: SheetConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where and how to read the assignment spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Base URL of the values endpoint (e.g. "https://sheets.googleapis.com")
    #[serde(default = "default_sheet_base_url")]
    pub base_url: String,
    /// Spreadsheet document id (from the sheet URL)
    pub document_id: String,
    /// Worksheet name within the document
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    /// API key for the values endpoint (empty = unauthenticated)
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds; a timed-out read counts as the source
    /// being unavailable
    #[serde(default = "default_sheet_timeout")]
    pub timeout_seconds: u64,
}

fn default_sheet_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}
fn default_worksheet() -> String {
    "Hoja 1".to_string()
}
fn default_sheet_timeout() -> u64 {
    30
}

/// Polling cadence and retry policy for the observer loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between successful observation cycles
    #[serde(default = "default_poll_interval")]
    pub interval_seconds: u64,
    /// Consecutive failures before the source is flagged as persistently
    /// failing (the loop keeps retrying regardless)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for the exponential retry backoff
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
    /// Upper bound for the retry backoff
    #[serde(default = "default_max_backoff")]
    pub max_backoff_seconds: u64,
}

fn default_poll_interval() -> u64 {
    20
}
fn default_max_retries() -> u32 {
    5
}
fn default_retry_delay() -> u64 {
    30
}
fn default_max_backoff() -> u64 {
    300
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_poll_interval(),
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay(),
            max_backoff_seconds: default_max_backoff(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Bound of each viewer's outbound queue; a viewer that falls this far
    /// behind is disconnected rather than slowing the rest
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    32
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    /// Disable CORS restrictions (allows all origins) - use only in development!
    #[serde(default)]
    pub disable: bool,
    #[serde(default)]
    pub additional_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable file logging
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
    /// Directory for log files (relative to executable or absolute path)
    #[serde(default = "default_log_directory")]
    pub directory: String,
    /// Prefix for log file names
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
    /// Rotation strategy: "daily", "hourly", or "never"
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
}

fn default_logging_enabled() -> bool {
    true
}
fn default_log_directory() -> String {
    "logs".to_string()
}
fn default_log_file_prefix() -> String {
    "aula-board-server".to_string()
}
fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            directory: default_log_directory(),
            file_prefix: default_log_file_prefix(),
            rotation: default_log_rotation(),
        }
    }
}

impl Config {
    /// Load config from layered TOML files
    ///
    /// Loads configuration files in the following order (later files override earlier):
    /// 1. {base_name}.toml (required, e.g., config.toml)
    /// 2. {base_name}.{ENV}.toml (optional, only if CONFIG_ENV is set)
    /// 3. {base_name}.local.toml (optional, for personal overrides, git-ignored)
    pub fn from_file<P: AsRef<Path>>(base_name: P) -> Result<Self> {
        let base_path = base_name.as_ref();
        let base_str = base_path.to_str().context("Invalid base path")?;

        let mut builder = config::Config::builder()
            // 1. Load base config (required)
            .add_source(config::File::with_name(base_str));

        // 2. Load environment-specific config (optional)
        if let Ok(env) = std::env::var("CONFIG_ENV") {
            let env_config = format!("{}.{}", base_str, env);
            builder = builder.add_source(config::File::with_name(&env_config).required(false));
        }

        // 3. Load local config (optional, for personal overrides)
        let local_config = format!("{}.local", base_str);
        builder = builder.add_source(config::File::with_name(&local_config).required(false));

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Get server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Origins allowed by CORS (the dashboard deployments, if any)
    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors.additional_origins.clone()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            sheet: SheetConfig {
                base_url: default_sheet_base_url(),
                document_id: String::new(),
                worksheet: default_worksheet(),
                api_key: String::new(),
                timeout_seconds: default_sheet_timeout(),
            },
            poll: PollConfig::default(),
            hub: HubConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
