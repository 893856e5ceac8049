//! webprobe Common - Shared utilities: logging and configuration
//!
//! This crate provides common functionality used across all webprobe crates.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigBuilder, HttpConfig, LoggingConfig, ScannerConfig};
pub use logging::{init_logging, try_init_logging, LogConfig, LogFormat};
