//! SQL injection detection
//!
//! Error-based first: a payload is reported only when it makes a database
//! error appear that the unmodified request did not already show. When no
//! payload produces an error, sleep payloads look for blind injection.

use super::{collect_injection_points, InjectionPoint};
use crate::client::{ClientConfig, ClientError, HttpClient, HttpResponse};
use crate::ScanConfig;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};
use webprobe_core::{category, AttackSurface, Detector, Finding, Severity, Target};

/// Fields tested per form
const MAX_FIELDS_PER_FORM: usize = 3;

const ERROR_PAYLOADS: &[&str] = &[
    "'",
    "\"",
    "' OR '1'='1",
    "' OR 1=1--",
    "admin'--",
    "' UNION SELECT NULL--",
    "') OR ('1'='1",
];

/// `(database, payload)`; each asks the database to stall for five seconds
const TIME_PAYLOADS: &[(&str, &str)] = &[
    ("MySQL", "1' AND SLEEP(5)--"),
    ("MSSQL", "1'; WAITFOR DELAY '0:0:5'--"),
    ("PostgreSQL", "1' AND pg_sleep(5)--"),
];

const SLEEP_THRESHOLD: Duration = Duration::from_secs(5);

/// Time probes need room beyond the sleep itself
const TIME_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// `(database, phrase)`, matched against the lowercased body
const DB_ERROR_PHRASES: &[(&str, &str)] = &[
    ("MySQL", "you have an error in your sql syntax"),
    ("MySQL", "warning: mysql"),
    ("MySQL", "mysql_fetch"),
    ("MySQL", "mysql_num_rows"),
    ("MariaDB", "mariadb server version for the right syntax"),
    ("PostgreSQL", "postgresql query failed"),
    ("PostgreSQL", "pg_query() expects"),
    ("PostgreSQL", "unterminated quoted string"),
    ("PostgreSQL", "syntax error at or near"),
    ("MSSQL", "microsoft sql native client error"),
    ("MSSQL", "odbc sql server driver"),
    ("MSSQL", "unclosed quotation mark after the character string"),
    ("MSSQL", "unclosed quotation mark"),
    ("Oracle", "quoted string not properly terminated"),
    ("Oracle", "oracle error"),
    ("SQLite", "sqlite_error"),
    ("SQLite", "sqlite3::"),
    ("SQLite", "unrecognized token:"),
    ("Generic", "sql syntax"),
    ("Generic", "syntax error"),
    ("Generic", "database error"),
    ("Generic", "sqlstate"),
];

/// Error shapes that need more than a substring
static DB_ERROR_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("Oracle", r"(?i)\bORA-\d{5}\b"),
        ("PostgreSQL", r"(?i)\bPG::[A-Za-z]+Error\b"),
        ("SQLite", r"(?i)\bSQLite(3)?::(SQLException|Exception)\b"),
        ("Generic", r"(?i)\bSQLSTATE\[\w+\]"),
    ]
    .into_iter()
    .filter_map(|(db, pattern)| Regex::new(pattern).ok().map(|re| (db, re)))
    .collect()
});

/// Database error signatures in a body, as `"<database>: <match>"`.
/// Engine-specific phrases come before generic ones.
pub fn database_errors(body: &str) -> Vec<String> {
    let lower = body.to_lowercase();
    let mut found: Vec<String> = DB_ERROR_PHRASES
        .iter()
        .filter(|(_, phrase)| lower.contains(phrase))
        .map(|(db, phrase)| format!("{}: {}", db, phrase))
        .collect();
    for (db, re) in DB_ERROR_PATTERNS.iter() {
        if let Some(m) = re.find(body) {
            found.push(format!("{}: {}", db, m.as_str().to_lowercase()));
        }
    }
    found
}

/// First error signature in `body` that the baseline did not show
pub fn new_database_error(baseline: &HashSet<String>, body: &str) -> Option<String> {
    database_errors(body)
        .into_iter()
        .find(|sig| !baseline.contains(sig))
}

/// Probes query parameters and form fields with SQL metacharacters
pub struct SqlInjectionDetector {
    client: ClientConfig,
}

impl SqlInjectionDetector {
    pub const ID: &'static str = "sql-injection";

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
        let slow_client = HttpClient::new(
            &self
                .client
                .clone()
                .with_timeout(self.client.timeout.max(TIME_PROBE_TIMEOUT)),
        )?;

        let points = collect_injection_points(target, surface, MAX_FIELDS_PER_FORM);
        debug!("Testing {} injection points for SQL injection", points.len());

        let mut findings = Vec::new();
        for point in &points {
            if let Some(finding) = self.test_point(&client, &slow_client, point).await {
                info!("SQL injection in {} {}", point.kind(), point.name());
                findings.push(finding);
            }
        }
        Ok(findings)
    }

    async fn test_point(
        &self,
        client: &HttpClient,
        slow_client: &HttpClient,
        point: &InjectionPoint,
    ) -> Option<Finding> {
        let baseline = match point.send(client, &point.original_value()).await {
            Ok(r) => r,
            Err(e) => {
                debug!("Baseline for {} failed: {}", point.name(), e);
                return None;
            }
        };
        let known: HashSet<String> = database_errors(&baseline.body).into_iter().collect();

        for payload in ERROR_PAYLOADS {
            match point.send(client, payload).await {
                Ok(response) => {
                    if let Some(signature) = new_database_error(&known, &response.body) {
                        return Some(error_based_finding(point, payload, &signature, &response));
                    }
                }
                Err(e) => debug!("SQLi probe on {} failed: {}", point.name(), e),
            }
        }

        if baseline.elapsed() >= SLEEP_THRESHOLD {
            debug!(
                "Skipping time-based SQLi on {}: baseline took {}ms",
                point.name(),
                baseline.response_time_ms
            );
            return None;
        }

        for (database, payload) in TIME_PAYLOADS {
            match point.send(slow_client, payload).await {
                Ok(response) if response.elapsed() >= SLEEP_THRESHOLD => {
                    return Some(time_based_finding(point, database, payload, &response));
                }
                Ok(_) => {}
                Err(e) => debug!("Time-based probe on {} failed: {}", point.name(), e),
            }
        }

        None
    }
}

const REFERENCES: &[&str] = &[
    "https://owasp.org/www-community/attacks/SQL_Injection",
    "https://cheatsheetseries.owasp.org/cheatsheets/SQL_Injection_Prevention_Cheat_Sheet.html",
];

const REMEDIATION: &str = "Use parameterized queries (prepared statements) or an ORM for every \
query that includes user input; never build SQL by string concatenation. Validate input types, \
run the application with a least-privilege database account, and suppress database error \
messages in responses.";

fn error_based_finding(
    point: &InjectionPoint,
    payload: &str,
    signature: &str,
    response: &HttpResponse,
) -> Finding {
    Finding::builder(
        category::INJECTION,
        format!("SQL Injection in {}: {}", point.kind(), point.name()),
    )
    .severity(Severity::Critical)
    .description(format!(
        "Submitting {} through the {} '{}' produced a database error that the unmodified request \
         did not ({}). User input reaches a SQL query without being parameterized, so an \
         attacker can read, modify or delete data and may bypass authentication.",
        payload,
        point.kind(),
        point.name(),
        signature
    ))
    .evidence("url", point.endpoint())
    .evidence("parameter", point.name())
    .evidence("method", point.method().as_str())
    .evidence("payload", payload)
    .evidence("error_pattern", signature)
    .evidence("status_code", response.status)
    .evidence("detection_method", "Error-based")
    .remediation(REMEDIATION)
    .reference(REFERENCES[0])
    .reference(REFERENCES[1])
    .detector(SqlInjectionDetector::ID)
    .build()
}

fn time_based_finding(
    point: &InjectionPoint,
    database: &str,
    payload: &str,
    response: &HttpResponse,
) -> Finding {
    Finding::builder(
        category::INJECTION,
        format!("Blind SQL Injection in {}: {}", point.kind(), point.name()),
    )
    .severity(Severity::High)
    .description(format!(
        "A {} sleep payload submitted through the {} '{}' delayed the response by {}ms, while \
         the unmodified request returned promptly. The input is likely evaluated by the database.",
        database,
        point.kind(),
        point.name(),
        response.response_time_ms
    ))
    .evidence("url", point.endpoint())
    .evidence("parameter", point.name())
    .evidence("method", point.method().as_str())
    .evidence("payload", payload)
    .evidence("database", database)
    .evidence("response_time_ms", response.response_time_ms)
    .evidence("detection_method", "Time-based")
    .remediation(REMEDIATION)
    .reference(REFERENCES[0])
    .reference(REFERENCES[1])
    .detector(SqlInjectionDetector::ID)
    .build()
}

#[async_trait]
impl Detector for SqlInjectionDetector {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "SQL Injection"
    }

    async fn check(&self, target: &Target, surface: &AttackSurface) -> Vec<Finding> {
        self.run(target, surface).await.unwrap_or_else(|e| {
            debug!("{}: {}", Self::ID, e);
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        assert_eq!(DB_ERROR_PATTERNS.len(), 4);
    }

    #[test]
    fn test_mysql_error_detected() {
        let errors = database_errors(
            "<b>You have an error in your SQL syntax; check the manual that corresponds to your MySQL server</b>",
        );
        assert_eq!(
            errors,
            vec!["MySQL: you have an error in your sql syntax", "Generic: sql syntax"]
        );
    }

    #[test]
    fn test_oracle_code_detected() {
        let errors = database_errors("ORA-01756: quoted string not properly terminated");
        assert_eq!(
            errors,
            vec!["Oracle: quoted string not properly terminated", "Oracle: ora-01756"]
        );
    }

    #[test]
    fn test_baseline_errors_ignored() {
        // A tutorial page that always mentions "syntax error"
        let tutorial = "<p>How to fix a syntax error in your code</p>";
        let baseline: HashSet<String> = database_errors(tutorial).into_iter().collect();
        assert!(new_database_error(&baseline, tutorial).is_none());
        assert_eq!(
            new_database_error(&baseline, "Warning: mysql_fetch_array() expects parameter 1"),
            Some("MySQL: warning: mysql".to_string())
        );
    }

    #[test]
    fn test_time_payloads_are_plain_sleeps() {
        for (database, payload) in TIME_PAYLOADS {
            assert!(
                ["SLEEP(5)", "WAITFOR DELAY '0:0:5'", "pg_sleep(5)"]
                    .iter()
                    .any(|sleep| payload.contains(sleep)),
                "{} payload is not a fixed sleep: {}",
                database,
                payload
            );
        }
    }

    #[test]
    fn test_clean_page() {
        assert!(database_errors("<html><body>Search results for 'shoes'</body></html>").is_empty());
    }
}
