//! Crawl statistics
//!
//! Counters are atomics owned by the coordinator and read through
//! [`CrawlStats::snapshot`], which is also what checkpoints store.

use crate::frontier::FrontierStats;
use crate::state::CrawlState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live crawl counters
#[derive(Debug, Default)]
pub struct CrawlStats {
    requests_attempted: AtomicU64,
    requests_succeeded: AtomicU64,
    requests_failed: AtomicU64,
    robots_denied: AtomicU64,
    pages_processed: AtomicU64,
    pages_saved: AtomicU64,
    documents_saved: AtomicU64,
    links_extracted: AtomicU64,
    storage_errors: AtomicU64,
}

/// Serializable copy of [`CrawlStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlStatsSnapshot {
    pub requests_attempted: u64,
    pub requests_succeeded: u64,
    pub requests_failed: u64,
    pub robots_denied: u64,
    pub pages_processed: u64,
    pub pages_saved: u64,
    pub documents_saved: u64,
    pub links_extracted: u64,
    pub storage_errors: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores counters from a checkpoint
    pub fn from_snapshot(snapshot: &CrawlStatsSnapshot) -> Self {
        Self {
            requests_attempted: AtomicU64::new(snapshot.requests_attempted),
            requests_succeeded: AtomicU64::new(snapshot.requests_succeeded),
            requests_failed: AtomicU64::new(snapshot.requests_failed),
            robots_denied: AtomicU64::new(snapshot.robots_denied),
            pages_processed: AtomicU64::new(snapshot.pages_processed),
            pages_saved: AtomicU64::new(snapshot.pages_saved),
            documents_saved: AtomicU64::new(snapshot.documents_saved),
            links_extracted: AtomicU64::new(snapshot.links_extracted),
            storage_errors: AtomicU64::new(snapshot.storage_errors),
        }
    }

    pub fn record_request(&self) {
        self.requests_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self) {
        self.robots_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_page_processed(&self) {
        self.pages_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_page_saved(&self) {
        self.pages_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_document_saved(&self) {
        self.documents_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_links(&self, count: usize) {
        self.links_extracted.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_storage_error(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_succeeded(&self) -> u64 {
        self.requests_succeeded.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CrawlStatsSnapshot {
        CrawlStatsSnapshot {
            requests_attempted: self.requests_attempted.load(Ordering::Relaxed),
            requests_succeeded: self.requests_succeeded.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            robots_denied: self.robots_denied.load(Ordering::Relaxed),
            pages_processed: self.pages_processed.load(Ordering::Relaxed),
            pages_saved: self.pages_saved.load(Ordering::Relaxed),
            documents_saved: self.documents_saved.load(Ordering::Relaxed),
            links_extracted: self.links_extracted.load(Ordering::Relaxed),
            storage_errors: self.storage_errors.load(Ordering::Relaxed),
        }
    }
}

/// Final outcome of one organization's crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub organization: String,
    pub state: CrawlState,

    /// Reason for a `Failed` state
    pub error: Option<String>,

    pub stats: CrawlStatsSnapshot,
    pub frontier: FrontierStats,

    /// Entries still pending when the crawl stopped
    pub pending: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Timestamp of the checkpoint this crawl resumed from
    pub resumed_from: Option<DateTime<Utc>>,
}

impl CrawlReport {
    /// Report for an organization whose crawl could not be set up at all
    pub fn failed(organization: impl Into<String>, error: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            organization: organization.into(),
            state: CrawlState::Failed,
            error: Some(error.into()),
            stats: CrawlStatsSnapshot::default(),
            frontier: FrontierStats::default(),
            pending: 0,
            started_at: now,
            finished_at: now,
            resumed_from: None,
        }
    }

    pub fn duration_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}
