//! Security health score
//!
//! Turns a list of findings into a 0-100 score and a letter grade. Every
//! finding costs `severity weight × category multiplier` points off a
//! perfect 100. The calculation is pure and works equally on fresh scan
//! output and on findings read back from storage.

use crate::finding::Finding;
use crate::severity::{category, Severity};
use crate::summary::SeverityCounts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MAX_RECOMMENDATIONS: usize = 5;

/// Letter grade for a health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            Grade::APlus
        } else if score >= 90.0 {
            Grade::A
        } else if score >= 85.0 {
            Grade::BPlus
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 75.0 {
            Grade::CPlus
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Grade::APlus => "Excellent",
            Grade::A => "Very Good",
            Grade::BPlus => "Good",
            Grade::B => "Acceptable",
            Grade::CPlus => "Fair",
            Grade::C => "Below Average",
            Grade::D => "Poor",
            Grade::F => "Critical",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Count and accumulated risk of one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRisk {
    pub count: usize,
    pub risk_points: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub total_findings: usize,
    pub by_severity: SeverityCounts,
    #[serde(default)]
    pub by_category: BTreeMap<String, CategoryRisk>,
    pub weighted_risk: f64,
}

/// Result of [`HealthScoreCalculator::calculate_health_score`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: f64,
    pub grade: Grade,
    pub status: String,
    pub risk_points: f64,
    pub breakdown: Breakdown,
    pub recommendations: Vec<String>,
}

/// Percentage of findings at each severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct SeverityDistribution {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

/// Computes health scores from findings
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthScoreCalculator;

impl HealthScoreCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Risk points of a single finding
    pub fn risk_points(finding: &Finding) -> f64 {
        finding.severity.weight() * category::multiplier(&finding.category)
    }

    pub fn calculate_health_score(&self, findings: &[Finding]) -> HealthScore {
        if findings.is_empty() {
            return HealthScore {
                score: 100.0,
                grade: Grade::APlus,
                status: Grade::APlus.status().to_string(),
                risk_points: 0.0,
                breakdown: Breakdown::default(),
                recommendations: vec![
                    "Continue regular security audits".to_string(),
                    "Maintain current security practices".to_string(),
                ],
            };
        }

        let mut total_risk = 0.0;
        let mut by_severity = SeverityCounts::default();
        let mut by_category: BTreeMap<String, CategoryRisk> = BTreeMap::new();

        for finding in findings {
            let points = Self::risk_points(finding);
            total_risk += points;
            by_severity.increment(finding.severity);

            let entry = by_category.entry(finding.category.clone()).or_default();
            entry.count += 1;
            entry.risk_points += points;
        }

        let raw_score = (100.0 - total_risk).max(0.0);
        let grade = Grade::from_score(raw_score);
        let recommendations = recommendations(&by_severity, &by_category, raw_score);

        for risk in by_category.values_mut() {
            risk.risk_points = round1(risk.risk_points);
        }

        HealthScore {
            score: round1(raw_score),
            grade,
            status: grade.status().to_string(),
            risk_points: round1(total_risk),
            breakdown: Breakdown {
                total_findings: findings.len(),
                by_severity,
                by_category,
                weighted_risk: round1(total_risk),
            },
            recommendations,
        }
    }

    /// Share of each severity in percent, one decimal. All zero when empty.
    pub fn severity_distribution(&self, counts: &SeverityCounts) -> SeverityDistribution {
        let total = counts.total();
        if total == 0 {
            return SeverityDistribution::default();
        }
        let pct = |n: usize| round1(n as f64 / total as f64 * 100.0);
        SeverityDistribution {
            critical: pct(counts.critical),
            high: pct(counts.high),
            medium: pct(counts.medium),
            low: pct(counts.low),
        }
    }
}

fn recommendations(
    counts: &SeverityCounts,
    by_category: &BTreeMap<String, CategoryRisk>,
    score: f64,
) -> Vec<String> {
    let mut recs = Vec::new();

    if counts.critical > 0 {
        recs.push(format!(
            "URGENT: Address {} critical {} immediately",
            counts.critical,
            plural(counts.critical)
        ));
    }
    if counts.high > 0 {
        recs.push(format!(
            "Fix {} high-severity {} within 24-48 hours",
            counts.high,
            plural(counts.high)
        ));
    }

    if by_category.contains_key(category::INJECTION) {
        recs.push("Implement parameterized queries to prevent SQL injection".to_string());
    }
    if by_category.contains_key(category::SENSITIVE_DATA_EXPOSURE) {
        recs.push("Remove exposed secrets and rotate credentials immediately".to_string());
    }
    if by_category.contains_key(category::SECURITY_MISCONFIGURATION) {
        recs.push("Review and harden security configurations (CORS, headers)".to_string());
    }

    let band: [&str; 2] = if score < 70.0 {
        [
            "Schedule comprehensive security audit with your team",
            "Consider implementing a Web Application Firewall (WAF)",
        ]
    } else if score < 85.0 {
        [
            "Continue addressing medium-severity issues",
            "Implement regular security scanning in CI/CD pipeline",
        ]
    } else {
        [
            "Maintain current security practices",
            "Schedule quarterly security reviews",
        ]
    };
    recs.extend(band.iter().map(|s| s.to_string()));

    recs.truncate(MAX_RECOMMENDATIONS);
    recs
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "vulnerability"
    } else {
        "vulnerabilities"
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
