//! Finding definitions - weaknesses discovered during scanning

use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Structured evidence attached to a finding
pub type Evidence = BTreeMap<String, Value>;

/// One reported weakness with evidence and remediation guidance.
///
/// This is also the durable record handed to storage, so every field
/// except `category`, `severity` and `title` tolerates being absent when
/// read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: String,
    #[serde(default)]
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub evidence: Evidence,
    #[serde(default)]
    pub remediation: String,
    #[serde(default)]
    pub references: Vec<String>,

    /// Detector that produced the finding
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detector: String,
    #[serde(default = "Utc::now")]
    pub detected_at: DateTime<Utc>,
}

impl Finding {
    /// Create a new finding builder
    pub fn builder(category: impl Into<String>, title: impl Into<String>) -> FindingBuilder {
        FindingBuilder::new(category, title)
    }
}

/// Builder for constructing findings
pub struct FindingBuilder {
    finding: Finding,
}

impl FindingBuilder {
    pub fn new(category: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            finding: Finding {
                category: category.into(),
                severity: Severity::Low,
                title: title.into(),
                description: String::new(),
                evidence: Evidence::new(),
                remediation: String::new(),
                references: Vec::new(),
                detector: String::new(),
                detected_at: Utc::now(),
            },
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.finding.severity = severity;
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.finding.description = desc.into();
        self
    }

    /// Add one evidence entry. Anything serializable to JSON is accepted.
    pub fn evidence(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.finding.evidence.insert(key.into(), value.into());
        self
    }

    pub fn remediation(mut self, remediation: impl Into<String>) -> Self {
        self.finding.remediation = remediation.into();
        self
    }

    pub fn reference(mut self, url: impl Into<String>) -> Self {
        self.finding.references.push(url.into());
        self
    }

    pub fn detector(mut self, id: impl Into<String>) -> Self {
        self.finding.detector = id.into();
        self
    }

    pub fn build(self) -> Finding {
        self.finding
    }
}
