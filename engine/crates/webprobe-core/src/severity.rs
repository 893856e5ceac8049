//! Severity levels and finding categories

use serde::{Deserialize, Deserializer, Serialize};

/// Severity level for findings
///
/// Serialized in upper case (`"HIGH"`). Deserialization is lenient: any
/// unrecognized value, string or not, becomes [`Severity::Low`] so that
/// stored records with foreign severity labels are still counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Low severity, minimal risk
    #[default]
    Low,
    /// Medium severity, moderate risk
    Medium,
    /// High severity, significant risk
    High,
    /// Critical severity, immediate action required
    Critical,
}

impl Severity {
    /// All levels, highest first
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Parse a severity label, case-insensitive. Unknown labels map to `Low`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "HIGH" => Severity::High,
            "MEDIUM" => Severity::Medium,
            _ => Severity::Low,
        }
    }

    /// Risk weight used by the health score (CVSS-like 0-10 scale)
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Critical => 10.0,
            Severity::High => 7.5,
            Severity::Medium => 4.0,
            Severity::Low => 1.0,
        }
    }

    /// Get display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw
            .as_str()
            .map(Severity::parse_lenient)
            .unwrap_or_default())
    }
}

/// Well-known finding categories.
///
/// Categories are plain strings on [`crate::Finding`] so that records
/// produced elsewhere keep whatever label they carry.
pub mod category {
    pub const INJECTION: &str = "Injection";
    pub const SENSITIVE_DATA_EXPOSURE: &str = "Sensitive Data Exposure";
    pub const BROKEN_AUTHENTICATION: &str = "Broken Authentication";
    pub const DIRECTORY_EXPOSURE: &str = "Directory/File Exposure";
    pub const SECURITY_MISCONFIGURATION: &str = "Security Misconfiguration";
    pub const XSS: &str = "XSS";
    pub const INSECURE_COOKIES: &str = "Insecure Cookies";
    pub const INFORMATION_DISCLOSURE: &str = "Information Disclosure";
    pub const MISSING_SECURITY_HEADER: &str = "Missing Security Header";

    /// Risk multiplier for a category; unknown categories weigh 1.0
    pub fn multiplier(category: &str) -> f64 {
        match category {
            INJECTION => 1.5,
            SENSITIVE_DATA_EXPOSURE | BROKEN_AUTHENTICATION => 1.4,
            DIRECTORY_EXPOSURE => 1.3,
            SECURITY_MISCONFIGURATION | XSS => 1.2,
            INSECURE_COOKIES => 1.1,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_lenient_parsing() {
        assert_eq!(Severity::parse_lenient("critical"), Severity::Critical);
        assert_eq!(Severity::parse_lenient(" High "), Severity::High);
        assert_eq!(Severity::parse_lenient("INFO"), Severity::Low);
        assert_eq!(Severity::parse_lenient(""), Severity::Low);
    }

    #[test]
    fn test_unknown_severity_deserializes_to_low() {
        let sev: Severity = serde_json::from_str("\"SEVERE\"").unwrap();
        assert_eq!(sev, Severity::Low);
        let sev: Severity = serde_json::from_str("null").unwrap();
        assert_eq!(sev, Severity::Low);
        let sev: Severity = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(sev, Severity::Medium);
    }

    #[test]
    fn test_non_string_severity_deserializes_to_low() {
        for raw in ["3", "true", "{\"level\":\"HIGH\"}", "[\"HIGH\"]"] {
            let sev: Severity = serde_json::from_str(raw).unwrap();
            assert_eq!(sev, Severity::Low, "{}", raw);
        }
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"CRITICAL\"");
    }

    #[test]
    fn test_category_multipliers() {
        assert_eq!(category::multiplier(category::INJECTION), 1.5);
        assert_eq!(category::multiplier(category::XSS), 1.2);
        assert_eq!(category::multiplier("Something Else"), 1.0);
    }
}
