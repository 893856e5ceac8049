//! HTTP client with security-focused configuration

use crate::ScanConfig;
use reqwest::{header, Client, Method};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// HTTP client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("Connection refused")]
    ConnectionRefused,

    #[error("Timeout after {0}s")]
    Timeout(u64),
}

/// Settings for one [`HttpClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub follow_redirects: bool,
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ClientConfig {
    fn from(config: &ScanConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.request_timeout_seconds),
            user_agent: config.user_agent.clone(),
            follow_redirects: true,
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }
}

impl ClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report 3xx responses as-is instead of following them
    pub fn no_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

/// HTTP response wrapper
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Response headers in arrival order; repeated headers appear repeatedly
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: String,
    /// Final URL (after redirects)
    pub final_url: String,
    /// Time until the body was fully read, in milliseconds
    pub response_time_ms: u64,
}

impl HttpResponse {
    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response is redirect (3xx)
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// First value of a header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a repeated header such as `Set-Cookie`
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Check if response is HTML
    pub fn is_html(&self) -> bool {
        self.content_type()
            .map(|ct| ct.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false)
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.response_time_ms)
    }
}

/// Thin wrapper over `reqwest::Client` that flattens responses into
/// [`HttpResponse`] values
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout_secs: u64,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let redirect = if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .redirect(redirect)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    /// Perform a GET request
    pub async fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        self.request(Method::GET, url, &[], None).await
    }

    /// Perform a GET request with extra request headers
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, ClientError> {
        self.request(Method::GET, url, headers, None).await
    }

    /// Perform a POST request with an url-encoded form body
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<HttpResponse, ClientError> {
        self.request(Method::POST, url, &[], Some(form)).await
    }

    /// Perform a custom request
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        form: Option<&[(String, String)]>,
    ) -> Result<HttpResponse, ClientError> {
        debug!("{} {}", method, url);
        let start = Instant::now();

        let mut request = self.client.request(method, url);
        for (name, value) in headers {
            if let (Ok(name), Ok(value)) = (
                header::HeaderName::from_bytes(name.as_bytes()),
                header::HeaderValue::from_str(value),
            ) {
                request = request.header(name, value);
            }
        }
        if let Some(form_data) = form {
            request = request.form(form_data);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let response_time_ms = start.elapsed().as_millis() as u64;

        Ok(HttpResponse {
            status,
            headers,
            body,
            final_url,
            response_time_ms,
        })
    }

    fn classify(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            ClientError::ConnectionRefused
        } else {
            ClientError::Request(e)
        }
    }
}
