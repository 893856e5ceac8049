//! Detector trait - the interface every vulnerability rule implements

use async_trait::async_trait;

use crate::finding::Finding;
use crate::surface::AttackSurface;
use crate::target::Target;

/// A rule-based vulnerability detector.
///
/// Detectors are stateless between runs and never fail: network or parsing
/// problems inside `check` degrade to "no finding". Each call may issue its
/// own outbound probes but must not mutate anything it is given.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Stable identifier (e.g. `"sql-injection"`)
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Probe the target and return zero or more findings
    async fn check(&self, target: &Target, surface: &AttackSurface) -> Vec<Finding>;
}
