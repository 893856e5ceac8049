//! webprobe WebApp - Web application scanning
//!
//! This crate provides the scanning engine:
//! - HTTP client with security-focused configuration
//! - Crawler for discovering same-origin pages and forms
//! - Rule-based detectors (headers, cookies, CORS, exposed paths,
//!   information disclosure, SQL injection, reflected XSS)
//! - `ScanEngine` running detectors in parallel under a deadline
//!
//! # Example
//!
//! ```no_run
//! use webprobe_core::UrlValidator;
//! use webprobe_webapp::{ScanConfig, ScanEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let target = UrlValidator::validate("https://example.com").unwrap();
//!     let config = ScanConfig::default()
//!         .with_max_depth(2)
//!         .with_timeout_seconds(60);
//!
//!     let result = ScanEngine::new(target, config).execute_scan().await;
//!
//!     for finding in result.findings {
//!         println!("{}: {}", finding.severity, finding.title);
//!     }
//! }
//! ```

pub mod checks;
pub mod client;
pub mod crawler;
pub mod engine;
pub mod headers;

pub use checks::{
    default_detectors, CookieSecurityDetector, CorsMisconfigurationDetector,
    DirectoryExposureDetector, InformationDisclosureDetector, InjectionPoint,
    SqlInjectionDetector, XssReflectionDetector,
};
pub use client::{ClientConfig, ClientError, HttpClient, HttpResponse};
pub use crawler::{discover, Crawler};
pub use engine::{ScanEngine, ScanMetadata, ScanPhase, ScanResult};
pub use headers::{HeaderAnalysis, SecurityHeaders, SecurityHeadersDetector};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use webprobe_common::Config;
use webprobe_core::Target;

/// Engine-facing scan configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum crawl depth in link hops from the target
    pub max_depth: u32,
    /// Overall scan deadline in seconds
    pub timeout_seconds: u64,
    /// Detectors running at once
    pub concurrency: usize,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Skip TLS certificate validation
    pub accept_invalid_certs: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ScanConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_depth: config.scanner.max_depth,
            timeout_seconds: config.scanner.timeout_seconds,
            concurrency: config.scanner.concurrency,
            request_timeout_seconds: config.http.request_timeout_seconds,
            user_agent: config.http.user_agent.clone(),
            accept_invalid_certs: config.http.accept_invalid_certs,
        }
    }
}

impl ScanConfig {
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_timeout_seconds(mut self, timeout: u64) -> Self {
        self.timeout_seconds = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_request_timeout_seconds(mut self, timeout: u64) -> Self {
        self.request_timeout_seconds = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Scan `target` with default settings apart from depth and deadline
pub async fn execute_scan(target: Target, max_depth: u32, timeout_seconds: u64) -> ScanResult {
    let config = ScanConfig::default()
        .with_max_depth(max_depth)
        .with_timeout_seconds(timeout_seconds);
    ScanEngine::new(target, config).execute_scan().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_process_config() {
        let config = ScanConfig::default();
        assert_eq!(config.max_depth, 1);
        assert_eq!(config.timeout_seconds, 60);
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.request_timeout_seconds, 10);
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.timeout_duration(), Duration::from_secs(60));
    }

    #[test]
    fn test_from_process_config() {
        let toml = r#"
            [scanner]
            max_depth = 3
            concurrency = 2

            [http]
            request_timeout_seconds = 4
            user_agent = "probe-test"
        "#;
        let config = ScanConfig::from(&Config::from_toml(toml).unwrap());
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.request_timeout_seconds, 4);
        assert_eq!(config.user_agent, "probe-test");
        assert_eq!(config.timeout_seconds, 60);
    }
}
