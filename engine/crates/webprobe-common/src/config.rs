//! Configuration management for webprobe
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional TOML file, and `WEBPROBE_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use webprobe_core::{Error, Result};

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "WEBPROBE_";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Scan orchestration settings
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Outbound HTTP settings shared by the crawler and detectors
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Merge with process environment variables (`WEBPROBE_` prefix)
    pub fn merge_env(self) -> Self {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary key lookup.
    ///
    /// Values that fail to parse are ignored and the previous setting kept.
    pub fn merge_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        // Scanner settings
        if let Some(n) = var("MAX_DEPTH").and_then(|v| v.parse().ok()) {
            self.scanner.max_depth = n;
        }
        if let Some(n) = var("TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            self.scanner.timeout_seconds = n;
        }
        if let Some(n) = var("CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.scanner.concurrency = n;
        }

        // HTTP
        if let Some(n) = var("HTTP_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            self.http.request_timeout_seconds = n;
        }
        if let Some(val) = var("USER_AGENT") {
            self.http.user_agent = val;
        }
        if let Some(b) = var("ACCEPT_INVALID_CERTS").and_then(|v| parse_bool(&v)) {
            self.http.accept_invalid_certs = b;
        }

        // Logging
        if let Some(val) = var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = var("LOG_FORMAT") {
            self.logging.format = val;
        }

        self
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.scanner.timeout_seconds == 0 {
            return Err(Error::InvalidConfig {
                key: "scanner.timeout_seconds".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.scanner.concurrency == 0 {
            return Err(Error::InvalidConfig {
                key: "scanner.concurrency".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.http.request_timeout_seconds == 0 {
            return Err(Error::InvalidConfig {
                key: "http.request_timeout_seconds".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Scan orchestration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Crawl depth below the target page
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Whole-scan deadline in seconds
    #[serde(default = "default_scan_timeout")]
    pub timeout_seconds: u64,

    /// Detectors allowed to run at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_max_depth() -> u32 {
    1
}

fn default_scan_timeout() -> u64 {
    60
}

fn default_concurrency() -> usize {
    5
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            timeout_seconds: default_scan_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Skip server certificate verification (NOT recommended)
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_request_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("webprobe/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            user_agent: default_user_agent(),
            accept_invalid_certs: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("pretty")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Builder for constructing Config
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.config.scanner.max_depth = depth;
        self
    }

    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.scanner.timeout_seconds = seconds;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.scanner.concurrency = n;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.http.user_agent = ua.into();
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn log_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
