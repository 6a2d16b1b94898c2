//! Configuration module for Magpie
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files covering both pipeline stages.
//!
//! # Example
//!
//! ```no_run
//! use magpie::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Downloading with {} workers", config.acquisition.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AcquisitionConfig, Config, DiscoveryConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
