//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::{CrawlReport, ExtractedLink, PageMetadata};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage used before initialize()")]
    NotInitialized,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Persists fetched content and the link graph for one organization.
/// Failures are reported to the caller, which logs them and carries on;
/// frontier bookkeeping never depends on storage succeeding.
pub trait Storage {
    /// Prepares the backend (directories, database)
    ///
    /// Called once before any other method. A failure here aborts the crawl.
    fn initialize(&mut self) -> StorageResult<()>;

    /// Saves an HTML page
    ///
    /// # Returns
    ///
    /// * `Ok(Some(path))` - Where the page was written
    /// * `Ok(None)` - Not written (duplicate content)
    fn save_page(
        &mut self,
        url: &str,
        bytes: &[u8],
        encoding: &str,
        metadata: &PageMetadata,
    ) -> StorageResult<Option<PathBuf>>;

    /// Saves a document (PDF, DOC, ...)
    ///
    /// Same return convention as [`Storage::save_page`].
    fn save_document(
        &mut self,
        url: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> StorageResult<Option<PathBuf>>;

    /// Records the links found on `source_url`
    fn add_links(&mut self, source_url: &str, links: &[ExtractedLink]) -> StorageResult<()>;

    /// Writes session-level output once the crawl has ended
    fn finalize(&mut self, report: &CrawlReport) -> StorageResult<()>;
}
