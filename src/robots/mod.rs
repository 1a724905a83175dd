//! Robots.txt handling module
//!
//! This module fetches, parses and caches robots.txt files and exposes them
//! to the crawler as a [`crate::crawler::PermissionOracle`].

mod cache;
mod oracle;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use oracle::RobotsOracle;
pub use parser::{RobotsRules, MAX_CRAWL_DELAY};
