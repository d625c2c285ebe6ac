//! Sale-Pager: paginated sale listing scraper
//!
//! This crate walks the paginated "sale" listings of a set of retailers,
//! saving one text artifact per fetched page and deciding, per category,
//! when to stop paginating. Page rendering is delegated to an external scrape
//! provider and the stop decision can be delegated to an external predicate.

pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

pub use crawler::{FetchError, PredicateError};

/// Main error type for Sale-Pager operations
#[derive(Debug, Error)]
pub enum PagerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No configuration found for retailer '{retailer}'")]
    ConfigNotFound { retailer: String },

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Stop predicate failed: {0}")]
    Predicate(#[from] PredicateError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

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

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern in config: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Sale-Pager operations
pub type Result<T> = std::result::Result<T, PagerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{RetailerConfig, RetailerStore, Settings};
pub use crawler::{Coordinator, RunMode};
pub use output::{PageArtifact, RunReport};
