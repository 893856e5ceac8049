//! Security header analysis
//!
//! A pure presence test over six headers. Values are not graded.

use crate::client::{ClientConfig, ClientError, HttpClient, HttpResponse};
use crate::ScanConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use webprobe_core::{category, AttackSurface, Detector, Finding, Severity, Target};

/// A header every response should carry
struct RequiredHeader {
    name: &'static str,
    purpose: &'static str,
    risk: &'static str,
    example: &'static str,
    severity: Severity,
    https_only: bool,
}

const REQUIRED_HEADERS: &[RequiredHeader] = &[
    RequiredHeader {
        name: "Content-Security-Policy",
        purpose: "Restricts where scripts, styles and other content may load from.",
        risk: "Injected markup and scripts run with the full privileges of the page.",
        example: "default-src 'self'",
        severity: Severity::Medium,
        https_only: false,
    },
    RequiredHeader {
        name: "X-Frame-Options",
        purpose: "Controls whether the page may be embedded in a frame.",
        risk: "The page can be framed invisibly to trick users into clicking (clickjacking).",
        example: "DENY",
        severity: Severity::Medium,
        https_only: false,
    },
    RequiredHeader {
        name: "Strict-Transport-Security",
        purpose: "Tells browsers to only ever connect over HTTPS.",
        risk: "A network attacker can downgrade connections to plain HTTP.",
        example: "max-age=31536000; includeSubDomains",
        severity: Severity::Medium,
        https_only: true,
    },
    RequiredHeader {
        name: "X-Content-Type-Options",
        purpose: "Stops browsers from guessing content types.",
        risk: "Uploaded or user-controlled files may be executed as scripts.",
        example: "nosniff",
        severity: Severity::Medium,
        https_only: false,
    },
    RequiredHeader {
        name: "Referrer-Policy",
        purpose: "Limits how much of the URL is sent to other sites.",
        risk: "Tokens or identifiers in URLs leak to third parties via the Referer header.",
        example: "strict-origin-when-cross-origin",
        severity: Severity::Low,
        https_only: false,
    },
    RequiredHeader {
        name: "Permissions-Policy",
        purpose: "Restricts which browser features (camera, microphone, location) the page may use.",
        risk: "Embedded or injected content can request sensitive browser features.",
        example: "geolocation=(), camera=(), microphone=()",
        severity: Severity::Medium,
        https_only: false,
    },
];

/// Status of a security header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderStatus {
    /// Header name
    pub name: String,
    /// Header value if present
    pub value: Option<String>,
    pub status: HeaderCheckStatus,
}

/// Header check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderCheckStatus {
    Present,
    Missing,
    /// Not applicable to this response (HSTS over plain HTTP)
    Skipped,
}

/// Security header analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderAnalysis {
    pub url: String,
    pub status_code: u16,
    pub present_headers_count: usize,
    pub headers: Vec<HeaderStatus>,
}

/// Security headers analyzer
pub struct SecurityHeaders;

impl SecurityHeaders {
    /// Analyze security headers from HTTP response
    pub fn analyze(response: &HttpResponse, url: &str, is_https: bool) -> HeaderAnalysis {
        let headers = REQUIRED_HEADERS
            .iter()
            .map(|req| {
                let value = response.header(req.name).map(String::from);
                let status = if req.https_only && !is_https {
                    HeaderCheckStatus::Skipped
                } else if value.is_some() {
                    HeaderCheckStatus::Present
                } else {
                    HeaderCheckStatus::Missing
                };
                HeaderStatus {
                    name: req.name.to_string(),
                    value,
                    status,
                }
            })
            .collect();

        HeaderAnalysis {
            url: url.to_string(),
            status_code: response.status,
            present_headers_count: response.headers.len(),
            headers,
        }
    }
}

impl HeaderAnalysis {
    pub fn missing(&self) -> impl Iterator<Item = &HeaderStatus> {
        self.headers
            .iter()
            .filter(|h| h.status == HeaderCheckStatus::Missing)
    }

    /// Convert analysis to security findings
    pub fn to_findings(&self) -> Vec<Finding> {
        self.missing()
            .filter_map(|h| REQUIRED_HEADERS.iter().find(|r| r.name == h.name))
            .map(|req| self.missing_header_finding(req))
            .collect()
    }

    fn missing_header_finding(&self, req: &RequiredHeader) -> Finding {
        Finding::builder(
            category::MISSING_SECURITY_HEADER,
            format!("Missing Security Header: {}", req.name),
        )
        .severity(req.severity)
        .description(format!(
            "The {} header is not set on responses from {}.\n\n{}\n\nRisk: {}",
            req.name, self.url, req.purpose, req.risk
        ))
        .evidence("url", self.url.as_str())
        .evidence("missing_header", req.name)
        .evidence("status_code", self.status_code)
        .evidence("present_headers_count", self.present_headers_count)
        .remediation(format!(
            "Configure the web server or application to send the header on every response.\n\
             Expected value: {name}: {example}\n\n\
             Nginx:   add_header {name} \"{example}\" always;\n\
             Apache:  Header set {name} \"{example}\"",
            name = req.name,
            example = req.example
        ))
        .reference("https://owasp.org/www-project-secure-headers/")
        .reference(format!(
            "https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/{}",
            req.name
        ))
        .detector(SecurityHeadersDetector::ID)
        .build()
    }
}

/// Flags missing security headers on the target page
pub struct SecurityHeadersDetector {
    client: ClientConfig,
}

impl SecurityHeadersDetector {
    pub const ID: &'static str = "security-headers";

    pub fn new(config: &ScanConfig) -> Self {
        Self {
            client: ClientConfig::from(config),
        }
    }

    async fn run(&self, target: &Target) -> Result<Vec<Finding>, ClientError> {
        let client = HttpClient::new(&self.client)?;
        let response = client.get(target.as_str()).await?;
        let analysis = SecurityHeaders::analyze(&response, target.as_str(), target.is_https());
        Ok(analysis.to_findings())
    }
}

#[async_trait]
impl Detector for SecurityHeadersDetector {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Security Headers"
    }

    async fn check(&self, target: &Target, _surface: &AttackSurface) -> Vec<Finding> {
        self.run(target).await.unwrap_or_else(|e| {
            debug!("{}: {}", Self::ID, e);
            Vec::new()
        })
    }
}
