//! CORS misconfiguration probing

use crate::client::{ClientConfig, ClientError, HttpClient, HttpResponse};
use crate::ScanConfig;
use async_trait::async_trait;
use tracing::debug;
use webprobe_core::{category, AttackSurface, Detector, Finding, Severity, Target};

/// Origins sent in the `Origin` header, in probe order
pub const PROBE_ORIGINS: &[&str] = &["https://evil.example", "null", "https://attacker.example"];

const REFERENCES: &[&str] = &[
    "https://portswigger.net/web-security/cors",
    "https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS",
];

const REMEDIATION: &str = "Replace origin reflection with an explicit allow-list of trusted \
origins. Never echo the request's Origin header back verbatim, never allow the `null` origin, \
and only send `Access-Control-Allow-Credentials: true` for origins on the allow-list.";

/// CORS headers of one probe response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsResponse {
    pub allow_origin: Option<String>,
    pub allow_credentials: bool,
}

impl CorsResponse {
    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            allow_origin: response
                .header("access-control-allow-origin")
                .map(|v| v.trim().to_string()),
            allow_credentials: response
                .header("access-control-allow-credentials")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    fn echoes(&self, origin: &str) -> bool {
        self.allow_origin.as_deref() == Some(origin)
    }

    fn is_wildcard(&self) -> bool {
        self.allow_origin.as_deref() == Some("*")
    }
}

/// Sends crafted `Origin` headers and inspects the CORS response headers
pub struct CorsMisconfigurationDetector {
    client: ClientConfig,
}

impl CorsMisconfigurationDetector {
    pub const ID: &'static str = "cors-misconfiguration";

    pub fn new(config: &ScanConfig) -> Self {
        Self {
            client: ClientConfig::from(config),
        }
    }

    /// Judge a sequence of `(origin sent, response)` pairs. `None` marks the
    /// request sent without an `Origin` header.
    pub fn evaluate(url: &str, probes: &[(Option<&str>, CorsResponse)]) -> Vec<Finding> {
        let mut reflected: Option<Finding> = None;
        let mut wildcard: Option<Finding> = None;

        for (origin, cors) in probes {
            if reflected.is_none() {
                if let Some(origin) = origin {
                    if cors.allow_credentials && cors.echoes(origin) {
                        reflected = Some(if *origin == "null" {
                            null_origin_finding(url)
                        } else {
                            reflected_origin_finding(url, origin)
                        });
                    }
                }
            }
            if wildcard.is_none() && cors.is_wildcard() && cors.allow_credentials {
                wildcard = Some(wildcard_finding(url, *origin));
            }
        }

        reflected.into_iter().chain(wildcard).collect()
    }

    async fn run(&self, target: &Target) -> Result<Vec<Finding>, ClientError> {
        let client = HttpClient::new(&self.client)?;
        let url = target.as_str();

        let mut probes: Vec<(Option<&str>, CorsResponse)> = Vec::new();
        for &origin in PROBE_ORIGINS {
            match client.get_with_headers(url, &[("Origin", origin)]).await {
                Ok(response) => probes.push((Some(origin), CorsResponse::from_response(&response))),
                Err(e) => debug!("CORS probe with Origin {} failed: {}", origin, e),
            }
        }
        match client.get(url).await {
            Ok(response) => probes.push((None, CorsResponse::from_response(&response))),
            Err(e) => debug!("CORS probe without Origin failed: {}", e),
        }

        Ok(Self::evaluate(url, &probes))
    }
}

fn reflected_origin_finding(url: &str, origin: &str) -> Finding {
    Finding::builder(
        category::SECURITY_MISCONFIGURATION,
        "Critical CORS Misconfiguration: Reflected Origin with Credentials",
    )
    .severity(Severity::Critical)
    .description(format!(
        "The server echoed the untrusted origin {} in Access-Control-Allow-Origin and allowed \
         credentials. Any website can make authenticated requests on behalf of a logged-in user \
         and read the responses.",
        origin
    ))
    .evidence("url", url)
    .evidence("test_origin", origin)
    .evidence("cors_allow_origin", origin)
    .evidence("cors_allow_credentials", "true")
    .remediation(REMEDIATION)
    .reference(REFERENCES[0])
    .reference(REFERENCES[1])
    .detector(CorsMisconfigurationDetector::ID)
    .build()
}

fn null_origin_finding(url: &str) -> Finding {
    Finding::builder(
        category::SECURITY_MISCONFIGURATION,
        "CORS Misconfiguration: Null Origin Accepted",
    )
    .severity(Severity::Critical)
    .description(
        "The server accepts the `null` origin with credentials. Sandboxed iframes and local \
         files send `Origin: null`, so an attacker page can read authenticated responses.",
    )
    .evidence("url", url)
    .evidence("test_origin", "null")
    .evidence("cors_allow_origin", "null")
    .evidence("cors_allow_credentials", "true")
    .remediation(REMEDIATION)
    .reference(REFERENCES[0])
    .reference(REFERENCES[1])
    .detector(CorsMisconfigurationDetector::ID)
    .build()
}

fn wildcard_finding(url: &str, origin: Option<&str>) -> Finding {
    Finding::builder(
        category::SECURITY_MISCONFIGURATION,
        "CORS Misconfiguration: Wildcard with Credentials",
    )
    .severity(Severity::Medium)
    .description(
        "The server sends `Access-Control-Allow-Origin: *` together with \
         `Access-Control-Allow-Credentials: true`. Browsers refuse this combination, but it \
         shows the CORS policy was not designed deliberately and non-browser clients may honor it.",
    )
    .evidence("url", url)
    .evidence("test_origin", origin.unwrap_or(""))
    .evidence("cors_allow_origin", "*")
    .evidence("cors_allow_credentials", "true")
    .remediation(REMEDIATION)
    .reference(REFERENCES[1])
    .detector(CorsMisconfigurationDetector::ID)
    .build()
}

#[async_trait]
impl Detector for CorsMisconfigurationDetector {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "CORS Misconfiguration"
    }

    async fn check(&self, target: &Target, _surface: &AttackSurface) -> Vec<Finding> {
        self.run(target).await.unwrap_or_else(|e| {
            debug!("{}: {}", Self::ID, e);
            Vec::new()
        })
    }
}
