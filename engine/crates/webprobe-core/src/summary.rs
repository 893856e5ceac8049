//! Scan result aggregation

use crate::finding::Finding;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Finding counts per severity level, always carrying all four levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts = Self::default();
        for f in findings {
            counts.increment(f.severity);
        }
        counts
    }

    pub fn increment(&mut self, severity: Severity) {
        *self.slot(severity) += 1;
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }

    fn slot(&mut self, severity: Severity) -> &mut usize {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
        }
    }
}

/// Coarse risk label derived from the worst severity present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Clean,
    Low,
    Medium,
    High,
}

/// Aggregate view of a scan's findings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_findings: usize,
    pub by_severity: SeverityCounts,
    pub by_category: BTreeMap<String, usize>,
    pub risk_score: RiskLevel,
}

impl Summary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let by_severity = SeverityCounts::from_findings(findings);

        let mut by_category = BTreeMap::new();
        for f in findings {
            *by_category.entry(f.category.clone()).or_insert(0) += 1;
        }

        // CRITICAL has no level of its own here
        let risk_score = if by_severity.critical + by_severity.high > 0 {
            RiskLevel::High
        } else if by_severity.medium > 0 {
            RiskLevel::Medium
        } else if by_severity.low > 0 {
            RiskLevel::Low
        } else {
            RiskLevel::Clean
        };

        Self {
            total_findings: findings.len(),
            by_severity,
            by_category,
            risk_score,
        }
    }
}
