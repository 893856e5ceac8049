//! Cookie flag inspection

use super::contains_ci;
use crate::client::{ClientConfig, ClientError, HttpClient};
use crate::ScanConfig;
use async_trait::async_trait;
use tracing::debug;
use webprobe_core::{category, AttackSurface, Detector, Finding, Severity, Target};

/// Name fragments that mark a cookie as carrying session or auth state
const SENSITIVE_NAME_TOKENS: &[&str] = &[
    "sess", "auth", "token", "id", "jwt", "csrf", "xsrf", "login", "user", "remember", "key",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CookieFlag {
    HttpOnly,
    Secure,
    SameSite,
}

impl CookieFlag {
    fn as_str(&self) -> &'static str {
        match self {
            CookieFlag::HttpOnly => "HttpOnly",
            CookieFlag::Secure => "Secure",
            CookieFlag::SameSite => "SameSite",
        }
    }

    fn impact(&self) -> &'static str {
        match self {
            CookieFlag::HttpOnly => "Scripts on the page can read the cookie, so any XSS can steal it.",
            CookieFlag::Secure => "The cookie may be sent over plain HTTP and intercepted.",
            CookieFlag::SameSite => "The cookie is attached to cross-site requests, enabling CSRF.",
        }
    }
}

/// Cookie name from a `Set-Cookie` value
fn cookie_name(set_cookie: &str) -> Option<&str> {
    let pair = set_cookie.split(';').next()?;
    let name = pair.split('=').next()?.trim();
    (!name.is_empty()).then_some(name)
}

/// Whether the cookie name suggests session or authentication state
pub fn is_sensitive_cookie(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SENSITIVE_NAME_TOKENS.iter().any(|t| lower.contains(t))
}

/// Flags absent from a `Set-Cookie` header. `Secure` is only required
/// over HTTPS.
fn missing_flags(set_cookie: &str, is_https: bool) -> Vec<CookieFlag> {
    // Attributes only; the value itself may contain anything
    let attributes = set_cookie.split_once(';').map(|(_, a)| a).unwrap_or("");

    let mut missing = Vec::new();
    if !contains_ci(attributes, "httponly") {
        missing.push(CookieFlag::HttpOnly);
    }
    if is_https && !contains_ci(attributes, "secure") {
        missing.push(CookieFlag::Secure);
    }
    if !contains_ci(attributes, "samesite") {
        missing.push(CookieFlag::SameSite);
    }
    missing
}

/// Flags sensitive cookies set without HttpOnly, Secure or SameSite
pub struct CookieSecurityDetector {
    client: ClientConfig,
}

impl CookieSecurityDetector {
    pub const ID: &'static str = "cookie-security";

    pub fn new(config: &ScanConfig) -> Self {
        Self {
            client: ClientConfig::from(config),
        }
    }

    /// Findings for a set of `Set-Cookie` header values
    pub fn analyze(set_cookies: &[&str], url: &str, is_https: bool) -> Vec<Finding> {
        set_cookies
            .iter()
            .filter_map(|header| {
                let name = cookie_name(header)?;
                if !is_sensitive_cookie(name) {
                    return None;
                }
                let missing = missing_flags(header, is_https);
                if missing.is_empty() {
                    return None;
                }
                Some(Self::finding(name, &missing, url, header))
            })
            .collect()
    }

    fn finding(name: &str, missing: &[CookieFlag], url: &str, header: &str) -> Finding {
        let flags: Vec<&str> = missing.iter().map(CookieFlag::as_str).collect();
        let impact: Vec<String> = missing
            .iter()
            .map(|f| format!("- {}: {}", f.as_str(), f.impact()))
            .collect();

        Finding::builder(category::INSECURE_COOKIES, format!("Insecure Cookie: {}", name))
            .severity(Severity::Medium)
            .description(format!(
                "The cookie '{}' looks like it carries session or authentication state but is \
                 missing: {}\n\n{}",
                name,
                flags.join(", "),
                impact.join("\n")
            ))
            .evidence("cookie_name", name)
            .evidence("missing_flags", flags.clone())
            .evidence("url", url)
            .evidence("set_cookie_header", header)
            .remediation(format!(
                "Set the missing attributes when issuing the cookie, for example:\n\
                 Set-Cookie: {}=<value>; HttpOnly; Secure; SameSite=Lax; Path=/",
                name
            ))
            .reference("https://owasp.org/www-community/controls/SecureCookieAttribute")
            .reference("https://owasp.org/www-community/HttpOnly")
            .detector(Self::ID)
            .build()
    }

    async fn run(&self, target: &Target) -> Result<Vec<Finding>, ClientError> {
        let client = HttpClient::new(&self.client)?;
        let response = client.get(target.as_str()).await?;
        let set_cookies = response.header_all("set-cookie");
        Ok(Self::analyze(&set_cookies, target.as_str(), target.is_https()))
    }
}

#[async_trait]
impl Detector for CookieSecurityDetector {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Cookie Security"
    }

    async fn check(&self, target: &Target, _surface: &AttackSurface) -> Vec<Finding> {
        self.run(target).await.unwrap_or_else(|e| {
            debug!("{}: {}", Self::ID, e);
            Vec::new()
        })
    }
}
