//! Magpie: a two-stage media hoarder for paginated social feeds
//!
//! This crate implements a discovery stage that drives a real browser over an
//! account's media timeline and harvests media links from the API responses
//! the page triggers, and an acquisition stage that downloads the harvested
//! links under bounded concurrency with retry and format-rescue logic.

pub mod browser;
pub mod config;
pub mod crawl;
pub mod fetch;
pub mod output;

use thiserror::Error;

/// Main error type for Magpie operations
#[derive(Debug, Error)]
pub enum MagpieError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser driver error: {0}")]
    Browser(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("No link file available: {0}")]
    LinkFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Magpie operations
pub type Result<T> = std::result::Result<T, MagpieError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use browser::{ApiResponse, PageDriver, PageStatus};
pub use config::Config;
pub use crawl::{CrawlSession, CrawlStrategy, MediaKind};
pub use fetch::{DownloadTask, TaskOutcome};
