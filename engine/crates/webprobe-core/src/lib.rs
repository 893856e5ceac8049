//! webprobe Core - Foundation types, traits, and error handling
//!
//! This crate provides the core abstractions used throughout webprobe:
//! - `Target` / `UrlValidator`: what may be scanned
//! - `AttackSurface`: pages and forms found by crawling
//! - `Finding`: a weakness discovered during scanning
//! - `Detector`: the trait that all vulnerability rules implement
//! - `Summary` / `HealthScoreCalculator`: aggregation and scoring

pub mod detector;
pub mod error;
pub mod finding;
pub mod health;
pub mod severity;
pub mod summary;
pub mod surface;
pub mod target;
pub mod validator;

// Re-export commonly used types at crate root
pub use detector::Detector;
pub use error::{Error, Result};
pub use finding::{Evidence, Finding, FindingBuilder};
pub use health::{
    Breakdown, CategoryRisk, Grade, HealthScore, HealthScoreCalculator, SeverityDistribution,
};
pub use severity::{category, Severity};
pub use summary::{RiskLevel, SeverityCounts, Summary};
pub use surface::{AttackSurface, Form, FormInput, FormMethod};
pub use target::Target;
pub use validator::{is_public_ip, RejectionReason, UrlValidator};
