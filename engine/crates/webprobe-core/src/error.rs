//! Error types for webprobe

use thiserror::Error;

use crate::validator::RejectionReason;

/// Result type alias using webprobe Error
pub type Result<T> = std::result::Result<T, Error>;

/// webprobe error types
#[derive(Error, Debug)]
pub enum Error {
    // === Scanning Errors ===
    #[error("Scan failed: {0}")]
    ScanFailed(String),

    #[error("Discovery failed for {target}: {message}")]
    DiscoveryFailed { target: String, message: String },

    #[error("Scan timed out after {seconds}s")]
    ScanTimeout { seconds: u64 },

    // === Detector Errors ===
    #[error("Detector failed: {detector} - {message}")]
    DetectorFailed { detector: String, message: String },

    // === Target Errors ===
    #[error("Invalid target: {0}")]
    InvalidTarget(#[from] RejectionReason),

    // === HTTP Errors ===
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if this error is fatal (should stop the scan)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::DiscoveryFailed { .. }
                | Error::HttpClient(_)
                | Error::Configuration(_)
                | Error::InvalidConfig { .. }
        )
    }

    /// Get an error code for logging
    pub fn code(&self) -> &'static str {
        match self {
            Error::ScanFailed(_) => "SCAN_FAILED",
            Error::DiscoveryFailed { .. } => "DISCOVERY_FAILED",
            Error::ScanTimeout { .. } => "SCAN_TIMEOUT",
            Error::DetectorFailed { .. } => "DETECTOR_FAILED",
            Error::InvalidTarget(reason) => reason.code(),
            Error::HttpClient(_) => "HTTP_CLIENT_ERROR",
            Error::Configuration(_) => "CONFIG_ERROR",
            Error::InvalidConfig { .. } => "INVALID_CONFIG",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = Error::DiscoveryFailed {
            target: "https://example.com/".into(),
            message: "client build failed".into(),
        };
        assert_eq!(err.code(), "DISCOVERY_FAILED");
        assert!(err.is_fatal());

        let err: Error = RejectionReason::Empty.into();
        assert_eq!(err.code(), "EMPTY_URL");
        assert!(!err.is_fatal());
    }
}
