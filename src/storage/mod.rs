//! Storage module for persisting crawl data
//!
//! This module handles everything written while crawling, including:
//! - Page and document files, with content-hash duplicate suppression
//! - A SQLite index of saved files and the link graph
//! - Session summaries (`links.json`, `metadata.json`)

mod files;
mod schema;
mod traits;

pub use files::{
    content_hash, document_extension, url_to_filename, FileStore, LinkRecord, StorageStats,
};
pub use traits::{Storage, StorageError, StorageResult};
