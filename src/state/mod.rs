//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: lifecycle of one organization's crawl (idle, running, completed, paused, failed)

mod crawl_state;

// Re-export main types
pub use crawl_state::CrawlState;
