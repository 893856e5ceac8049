//! Sensitive path enumeration
//!
//! A 200 alone proves nothing: SPAs and custom error pages answer every
//! path. Each hit must also pass a content filter before it is reported.

use crate::client::{ClientConfig, ClientError, HttpClient, HttpResponse};
use crate::ScanConfig;
use async_trait::async_trait;
use tracing::debug;
use webprobe_core::{category, AttackSurface, Detector, Finding, Severity, Target};

struct SensitivePath {
    path: &'static str,
    description: &'static str,
    risk: &'static str,
    severity: Severity,
}

const SENSITIVE_PATHS: &[SensitivePath] = &[
    SensitivePath {
        path: "/admin",
        description: "Administrative interface",
        risk: "Unauthorized access to admin functions",
        severity: Severity::High,
    },
    SensitivePath {
        path: "/admin.php",
        description: "PHP admin panel",
        risk: "Unauthorized administrative access",
        severity: Severity::High,
    },
    SensitivePath {
        path: "/administrator",
        description: "Administrator directory",
        risk: "Unauthorized administrative access",
        severity: Severity::High,
    },
    SensitivePath {
        path: "/backup",
        description: "Backup files directory",
        risk: "Backup archives or dumps containing sensitive data",
        severity: Severity::High,
    },
    SensitivePath {
        path: "/backups",
        description: "Backup files directory",
        risk: "Backup archives or dumps containing sensitive data",
        severity: Severity::High,
    },
    SensitivePath {
        path: "/.env",
        description: "Environment configuration file",
        risk: "API keys, database credentials and other secrets",
        severity: Severity::High,
    },
    SensitivePath {
        path: "/.git",
        description: "Git repository metadata",
        risk: "Source code and version history can be reconstructed",
        severity: Severity::Medium,
    },
    SensitivePath {
        path: "/config",
        description: "Configuration directory",
        risk: "Configuration files readable by anyone",
        severity: Severity::Medium,
    },
    SensitivePath {
        path: "/uploads",
        description: "File upload directory",
        risk: "Directory listing or unauthorized access to uploaded files",
        severity: Severity::Medium,
    },
    SensitivePath {
        path: "/phpinfo.php",
        description: "PHP information page",
        risk: "Full server configuration and environment disclosed",
        severity: Severity::Medium,
    },
    SensitivePath {
        path: "/debug",
        description: "Debug endpoint",
        risk: "Debugging output and internal state disclosed",
        severity: Severity::Medium,
    },
    SensitivePath {
        path: "/test",
        description: "Test directory",
        risk: "Test files or debug information left in production",
        severity: Severity::Low,
    },
];

const MIN_CONTENT_LENGTH: usize = 100;
const MIN_ENV_CONTENT_LENGTH: usize = 16;

/// Markers of a single-page app serving its shell for every route
const SPA_MARKERS: &[&str] = &[
    "<div id=\"root\"",
    "<div id=\"app\"",
    "<div id=\"__next\"",
    "window.__NEXT_DATA__",
    "react-root",
    "vue-app",
    "_app.js",
    "_buildManifest",
    "__webpack",
    "window.reactRender",
];

/// Error pages answered with status 200 (matched lowercase)
const SOFT_404_PHRASES: &[&str] = &[
    "not found",
    "404",
    "does not exist",
    "page not found",
    "cannot find",
    "no such file",
    "the requested url",
    "file not found",
];

const ENV_SECRET_TOKENS: &[&str] = &[
    "API_KEY", "SECRET", "PASSWORD", "DB_", "DATABASE", "TOKEN", "AWS_", "STRIPE_", "GOOGLE_",
];

const GIT_MARKERS: &[&str] = &[
    "ref:",
    "refs/",
    "HEAD",
    "objects/",
    "[core]",
    "repositoryformatversion",
];

const ADMIN_MARKERS: &[&str] = &[
    "admin login",
    "administrator login",
    "admin panel",
    "dashboard login",
    "<input type=\"password\"",
    "phpmyadmin",
    "wp-admin",
    "admin area",
    "login to admin",
];

const PHP_MARKERS: &[&str] = &["<?php", "<?=", "phpmyadmin"];

const PHPINFO_MARKERS: &[&str] = &["phpinfo()", "php version", "php api", "configuration"];

const BACKUP_MARKERS: &[&str] = &[
    "index of",
    "directory listing",
    "parent directory",
    ".zip",
    ".tar",
    ".sql",
    "backup-",
];

const LISTING_MARKERS: &[&str] = &[
    "index of /",
    "directory listing for",
    "parent directory",
    "[dir]",
    "<a href=\"../\">",
];

fn count_markers(haystack: &str, markers: &[&str]) -> usize {
    markers.iter().filter(|m| haystack.contains(*m)).count()
}

/// Whether a 200 response body really shows the sensitive resource at `path`
pub fn is_valid_exposure(path: &str, body: &str) -> bool {
    let min_len = if path == "/.env" {
        MIN_ENV_CONTENT_LENGTH
    } else {
        MIN_CONTENT_LENGTH
    };
    if body.len() < min_len {
        return false;
    }

    if SPA_MARKERS.iter().any(|m| body.contains(m)) {
        return false;
    }

    let lower = body.to_lowercase();
    if SOFT_404_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }

    match path {
        "/.env" => {
            let upper = body.to_uppercase();
            body.contains('=')
                && body.contains('\n')
                && ENV_SECRET_TOKENS.iter().any(|t| upper.contains(t))
        }
        "/.git" => count_markers(body, GIT_MARKERS) > 0,
        "/admin" | "/administrator" => count_markers(&lower, ADMIN_MARKERS) >= 2,
        "/admin.php" => {
            count_markers(&lower, ADMIN_MARKERS) >= 2 || count_markers(body, PHP_MARKERS) > 0
        }
        "/phpinfo.php" => count_markers(&lower, PHPINFO_MARKERS) >= 2,
        "/backup" | "/backups" => count_markers(&lower, BACKUP_MARKERS) > 0,
        _ => count_markers(&lower, LISTING_MARKERS) > 0,
    }
}

/// Requests well-known sensitive paths and reports those that are really
/// served
pub struct DirectoryExposureDetector {
    client: ClientConfig,
}

impl DirectoryExposureDetector {
    pub const ID: &'static str = "directory-exposure";

    pub fn new(config: &ScanConfig) -> Self {
        Self {
            client: ClientConfig::from(config).no_redirects(),
        }
    }

    fn finding(entry: &SensitivePath, url: &str, response: &HttpResponse) -> Finding {
        Finding::builder(
            category::DIRECTORY_EXPOSURE,
            format!("Exposed Path: {}", entry.path),
        )
        .severity(entry.severity)
        .description(format!(
            "{} is publicly reachable at {}.\n\nRisk: {}\n\nThe server answered 200 OK and the \
             content matches what this resource looks like, so this is not a catch-all page.",
            entry.description, url, entry.risk
        ))
        .evidence("url", url)
        .evidence("status_code", response.status)
        .evidence("content_length", response.body.len())
        .evidence(
            "content_type",
            response.content_type().unwrap_or("unknown"),
        )
        .remediation(format!(
            "Deny access to {} at the web server, move the files outside the web root, or put \
             the path behind authentication. Verify afterwards that it returns 403 or 404.\n\n\
             Nginx:   location ~ /\\. {{ deny all; return 404; }}\n\
             Apache:  <Files \".env\"> Require all denied </Files>",
            entry.path
        ))
        .reference(
            "https://owasp.org/www-project-web-security-testing-guide/latest/4-Web_Application_Security_Testing/02-Configuration_and_Deployment_Management_Testing/04-Review_Old_Backup_and_Unreferenced_Files_for_Sensitive_Information",
        )
        .detector(Self::ID)
        .build()
    }

    async fn run(&self, target: &Target) -> Result<Vec<Finding>, ClientError> {
        let client = HttpClient::new(&self.client)?;
        let mut findings = Vec::new();

        for entry in SENSITIVE_PATHS {
            let url = target.join_path(entry.path);
            let response = match client.get(&url).await {
                Ok(r) => r,
                Err(e) => {
                    debug!("Path probe {} failed: {}", url, e);
                    continue;
                }
            };
            if response.status == 200 && is_valid_exposure(entry.path, &response.body) {
                findings.push(Self::finding(entry, &url, &response));
            }
        }

        Ok(findings)
    }
}

#[async_trait]
impl Detector for DirectoryExposureDetector {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Directory Exposure"
    }

    async fn check(&self, target: &Target, _surface: &AttackSurface) -> Vec<Finding> {
        self.run(target).await.unwrap_or_else(|e| {
            debug!("{}: {}", Self::ID, e);
            Vec::new()
        })
    }
}
