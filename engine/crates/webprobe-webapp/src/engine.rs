//! Scan orchestration
//!
//! One [`ScanEngine`] runs one scan: crawl, run every detector against the
//! discovered surface under a shared deadline, then summarize. The engine
//! is consumed by [`ScanEngine::execute_scan`].

use crate::checks::default_detectors;
use crate::crawler;
use crate::ScanConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use webprobe_core::{AttackSurface, Detector, Error, Finding, Summary, Target};

/// Lifecycle of a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    #[default]
    Created,
    Discovering,
    Detecting,
    Summarizing,
    Done,
}

/// Bookkeeping about how a scan ran
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub scan_id: Uuid,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    /// The deadline passed before every detector reported
    pub timed_out: bool,
    /// Discovery could not run; findings are empty
    pub failed: bool,
    pub error: Option<String>,
    /// Phase reached when the result was produced
    pub phase: ScanPhase,
    /// Detectors whose results made it into `findings`
    pub detectors_completed: Vec<String>,
}

/// Everything one scan produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub attack_surface: AttackSurface,
    pub findings: Vec<Finding>,
    pub summary: Summary,
    pub metadata: ScanMetadata,
}

/// Runs a single scan of one target
pub struct ScanEngine {
    target: Target,
    config: ScanConfig,
    detectors: Vec<Arc<dyn Detector>>,
    phase: ScanPhase,
    timed_out: bool,
}

impl ScanEngine {
    /// Engine with the built-in detector set
    pub fn new(target: Target, config: ScanConfig) -> Self {
        let detectors = default_detectors(&config);
        Self::with_detectors(target, config, detectors)
    }

    /// Engine with a custom detector list, run in the given order
    pub fn with_detectors(
        target: Target,
        config: ScanConfig,
        detectors: Vec<Arc<dyn Detector>>,
    ) -> Self {
        Self {
            target,
            config,
            detectors,
            phase: ScanPhase::Created,
            timed_out: false,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Run the scan to completion. Always returns a result; failures are
    /// recorded in its metadata.
    pub async fn execute_scan(mut self) -> ScanResult {
        let scan_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let deadline = clock + Duration::from_secs(self.config.timeout_seconds);

        info!(
            "Starting scan {} of {} (depth {}, timeout {}s)",
            scan_id, self.target, self.config.max_depth, self.config.timeout_seconds
        );

        self.phase = ScanPhase::Discovering;
        let surface = match crawler::discover(
            &self.target,
            self.config.max_depth,
            deadline,
            &self.config,
        )
        .await
        {
            Ok(surface) => surface,
            Err(e) => {
                let err = Error::DiscoveryFailed {
                    target: self.target.to_string(),
                    message: e.to_string(),
                };
                error!("Scan {} failed [{}]: {}", scan_id, err.code(), err);
                return ScanResult {
                    attack_surface: AttackSurface::new(),
                    findings: Vec::new(),
                    summary: Summary::from_findings(&[]),
                    metadata: ScanMetadata {
                        scan_id,
                        target: self.target.to_string(),
                        started_at,
                        duration_seconds: clock.elapsed().as_secs_f64(),
                        timed_out: false,
                        failed: true,
                        error: Some(err.to_string()),
                        phase: self.phase,
                        detectors_completed: Vec::new(),
                    },
                };
            }
        };
        info!(
            "Discovery complete: {} urls, {} forms",
            surface.urls.len(),
            surface.forms.len()
        );

        self.phase = ScanPhase::Detecting;
        let surface = Arc::new(surface);
        let (findings, completed) = self.run_detectors(Arc::clone(&surface), deadline).await;

        self.phase = ScanPhase::Summarizing;
        let summary = Summary::from_findings(&findings);

        self.phase = ScanPhase::Done;
        let duration_seconds = clock.elapsed().as_secs_f64();
        info!(
            "Scan {} complete: {} findings in {:.1}s{}",
            scan_id,
            findings.len(),
            duration_seconds,
            if self.timed_out { " (timed out)" } else { "" }
        );

        // Detached detectors may still hold a reference
        let attack_surface = Arc::try_unwrap(surface).unwrap_or_else(|shared| (*shared).clone());

        ScanResult {
            attack_surface,
            findings,
            summary,
            metadata: ScanMetadata {
                scan_id,
                target: self.target.to_string(),
                started_at,
                duration_seconds,
                timed_out: self.timed_out,
                failed: false,
                error: None,
                phase: self.phase,
                detectors_completed: completed,
            },
        }
    }

    /// Run all detectors with bounded concurrency until they finish or the
    /// deadline passes. Findings come back in detector order.
    async fn run_detectors(
        &mut self,
        surface: Arc<AttackSurface>,
        deadline: Instant,
    ) -> (Vec<Finding>, Vec<String>) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut set = JoinSet::new();

        for (index, detector) in self.detectors.iter().enumerate() {
            let detector = Arc::clone(detector);
            let surface = Arc::clone(&surface);
            let target = self.target.clone();
            let semaphore = Arc::clone(&semaphore);

            set.spawn(async move {
                let id = detector.id().to_string();
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, id, Vec::new());
                };
                if Instant::now() >= deadline {
                    debug!("Skipping detector {}: deadline passed", id);
                    return (index, id, Vec::new());
                }
                debug!("Running detector: {}", detector.name());
                let findings = detector.check(&target, &surface).await;
                (index, id, findings)
            });
        }

        let mut results: Vec<Option<(String, Vec<Finding>)>> = vec![None; self.detectors.len()];
        loop {
            match timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok((index, id, findings)))) => {
                    if Instant::now() >= deadline {
                        self.timed_out = true;
                        break;
                    }
                    info!("Detector {} completed: {} findings", id, findings.len());
                    results[index] = Some((id, findings));
                }
                Ok(Some(Err(e))) => warn!("Detector task failed: {}", e),
                Ok(None) => break,
                Err(_) => {
                    self.timed_out = true;
                    break;
                }
            }
        }

        if self.timed_out {
            let err = Error::ScanTimeout {
                seconds: self.config.timeout_seconds,
            };
            warn!("{}; {} detectors still running", err, set.len());
            set.detach_all();
        }

        let mut findings = Vec::new();
        let mut completed = Vec::new();
        for (id, found) in results.into_iter().flatten() {
            completed.push(id);
            findings.extend(found);
        }
        (findings, completed)
    }
}
