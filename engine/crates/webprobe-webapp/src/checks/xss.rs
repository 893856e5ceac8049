//! Reflected XSS detection with inert markers
//!
//! The markers are tag-shaped but harmless. A finding needs the exact raw
//! marker back in an HTML response; an entity-escaped echo is safe.

use super::{collect_injection_points, InjectionPoint};
use crate::client::{ClientConfig, ClientError, HttpClient, HttpResponse};
use crate::ScanConfig;
use async_trait::async_trait;
use tracing::{debug, info};
use webprobe_core::{category, AttackSurface, Detector, Finding, Severity, Target};

/// Markers in probe order: plain tag, then attribute breakouts
pub const MARKERS: &[&str] = &["<XSS_TEST>", "\"><XSS_TEST>", "'><XSS_TEST>"];

/// Every injectable field of a form is tested
const MAX_FIELDS_PER_FORM: usize = usize::MAX;

/// Whether `marker` came back unescaped in an HTML response
pub fn is_reflected_unescaped(response: &HttpResponse, marker: &str) -> bool {
    response.is_html() && response.body.contains(marker)
}

/// Sends harmless markers through each input and looks for raw reflection
pub struct XssReflectionDetector {
    client: ClientConfig,
}

impl XssReflectionDetector {
    pub const ID: &'static str = "xss-reflection";

    pub fn new(config: &ScanConfig) -> Self {
        Self {
            client: ClientConfig::from(config).no_redirects(),
        }
    }

    async fn run(
        &self,
        target: &Target,
        surface: &AttackSurface,
    ) -> Result<Vec<Finding>, ClientError> {
        let client = HttpClient::new(&self.client)?;
        let points = collect_injection_points(target, surface, MAX_FIELDS_PER_FORM);
        debug!("Testing {} injection points for reflected XSS", points.len());

        let mut findings = Vec::new();
        for point in &points {
            if let Some(finding) = Self::test_point(&client, point).await {
                info!("Reflected XSS in {} {}", point.kind(), point.name());
                findings.push(finding);
            }
        }
        Ok(findings)
    }

    async fn test_point(client: &HttpClient, point: &InjectionPoint) -> Option<Finding> {
        for marker in MARKERS {
            match point.send(client, marker).await {
                Ok(response) if is_reflected_unescaped(&response, marker) => {
                    return Some(Self::finding(point, marker, &response));
                }
                Ok(_) => {}
                Err(e) => debug!("XSS probe on {} failed: {}", point.name(), e),
            }
        }
        None
    }

    fn finding(point: &InjectionPoint, marker: &str, response: &HttpResponse) -> Finding {
        Finding::builder(
            category::XSS,
            format!("Reflected XSS in {}: {}", point.kind(), point.name()),
        )
        .severity(Severity::High)
        .description(format!(
            "The {} '{}' is echoed into the HTML response without encoding. The harmless marker \
             {} came back verbatim, so a script tag submitted the same way would run in the \
             victim's browser with access to their session.",
            point.kind(),
            point.name(),
            marker
        ))
        .evidence("url", point.endpoint())
        .evidence("response_url", response.final_url.as_str())
        .evidence("parameter", point.name())
        .evidence("method", point.method().as_str())
        .evidence("payload", marker)
        .evidence("reflection_found", true)
        .remediation(
            "HTML-encode user input on output using the encoding for its context (element body, \
             attribute, JavaScript, URL). Prefer a templating engine that escapes by default and \
             add a Content-Security-Policy that blocks inline scripts.",
        )
        .reference("https://owasp.org/www-community/attacks/xss/")
        .reference("https://cheatsheetseries.owasp.org/cheatsheets/Cross_Site_Scripting_Prevention_Cheat_Sheet.html")
        .detector(Self::ID)
        .build()
    }
}

#[async_trait]
impl Detector for XssReflectionDetector {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Reflected XSS"
    }

    async fn check(&self, target: &Target, surface: &AttackSurface) -> Vec<Finding> {
        self.run(target, surface).await.unwrap_or_else(|e| {
            debug!("{}: {}", Self::ID, e);
            Vec::new()
        })
    }
}
