//! webprobe - Web application vulnerability scanner
//!
//! Validates the target, runs one scan and prints the scan result together
//! with its health score as JSON on stdout. Logs go to stderr.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use webprobe_common::{try_init_logging, Config, LogConfig};
use webprobe_core::{HealthScore, HealthScoreCalculator, UrlValidator};
use webprobe_webapp::{ScanConfig, ScanEngine, ScanResult};

/// Rule-based web application vulnerability scanner
#[derive(Parser, Debug)]
#[command(name = "webprobe")]
#[command(version)]
#[command(about = "Scan a public web application for common weaknesses", long_about = None)]
struct Args {
    /// Target URL (http or https, public hosts only)
    url: String,

    /// Crawl depth in link hops from the target (overrides config)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Overall scan deadline in seconds (overrides config)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Configuration file path
    #[arg(short, long, env = "WEBPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json, compact)
    #[arg(long)]
    log_format: Option<String>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    scan: &'a ScanResult,
    health: &'a HealthScore,
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };
    let mut config = config.merge_env();

    if let Some(depth) = args.depth {
        config.scanner.max_depth = depth;
    }
    if let Some(timeout) = args.timeout {
        config.scanner.timeout_seconds = timeout;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.logging.format = format.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    try_init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    info!("webprobe {} starting", env!("CARGO_PKG_VERSION"));

    let target = match UrlValidator::validate(&args.url) {
        Ok(target) => target,
        Err(reason) => bail!("invalid target [{}]: {}", reason.code(), reason),
    };

    let result = ScanEngine::new(target, ScanConfig::from(&config))
        .execute_scan()
        .await;
    let health = HealthScoreCalculator::new().calculate_health_score(&result.findings);

    info!(
        "Health score {:.1} ({}), {} findings",
        health.score,
        health.grade.as_str(),
        result.findings.len()
    );

    let report = Report {
        scan: &result,
        health: &health,
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    if result.metadata.failed {
        bail!(
            "scan failed: {}",
            result.metadata.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
