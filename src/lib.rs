//! orgcrawl: a polite, resumable crawler for organizational websites
//!
//! This crate crawls a bounded set of sites, fetching pages and documents
//! within a fixed scope (domain, depth, page budget) while respecting
//! robots.txt and a fixed request delay. Crawl progress lives in a
//! [`frontier::Frontier`] that can be checkpointed to disk and restored,
//! so an interrupted crawl resumes exactly where it stopped.

pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod frontier;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for orgcrawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL rejected: {0}")]
    Rejected(#[from] Rejected),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("Checkpoint scope does not match the configured scope ({0}); start a fresh crawl")]
    ScopeMismatch(String),

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

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Reasons the canonicalizer refuses a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Rejected {
    #[error("relative URL cannot be resolved without a base")]
    NotResolvable,

    #[error("only http and https URLs are supported")]
    UnsupportedScheme,

    #[error("malformed URL")]
    Malformed,
}

/// Result type alias for orgcrawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use frontier::{CrawlScope, EnqueueOutcome, Frontier, FrontierEntry, SkipReason};
pub use state::CrawlState;
pub use url::{canonicalize, CanonicalUrl};
