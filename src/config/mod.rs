//! Configuration module for orgcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use orgcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! for org in config.organizations_in_order() {
//!     println!("{}: {} seeds", org.name, org.seeds.len());
//! }
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FilterConfig, LoggingConfig, OrganizationConfig, OutputConfig,
    PriorityPatterns, RateLimitConfig, SessionConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
