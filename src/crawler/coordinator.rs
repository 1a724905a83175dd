//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator drives one organization's crawl through its lifecycle:
//! - Restoring the frontier from a checkpoint, or seeding it
//! - Pulling entries in priority order and checking robots.txt
//! - Fetching, then storing pages and documents
//! - Feeding discovered links back into the frontier
//! - Checkpointing periodically, on interruption and at the end
//!
//! Per-URL failures are handled inside the loop and never end the crawl.
//! Only resource-level problems (storage that cannot be initialized, an
//! unusable checkpoint location, a corrupt checkpoint) end it as `Failed`.

use super::traits::{ContentExtractor, FetchedContent, Fetcher, LinkKind, PermissionOracle};
use super::{CrawlReport, CrawlSettings, CrawlStats};
use crate::checkpoint::{self, CheckpointError};
use crate::frontier::{Frontier, FrontierEntry};
use crate::state::CrawlState;
use crate::storage::{Storage, StorageError};
use crate::url::{CanonicalUrl, DOCUMENT_PRIORITY, SEED_PRIORITY};
use crate::Result;
use chrono::{DateTime, Utc};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Entries processed between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Crawls one organization with the given collaborators
pub struct Coordinator<F, P, E, S> {
    settings: CrawlSettings,
    fetcher: F,
    oracle: P,
    extractor: E,
    storage: S,
    frontier: Frontier,
    stats: CrawlStats,
    state: CrawlState,
    interrupt: Arc<AtomicBool>,
    resumed_from: Option<DateTime<Utc>>,
}

impl<F, P, E, S> Coordinator<F, P, E, S>
where
    F: Fetcher,
    P: PermissionOracle,
    E: ContentExtractor,
    S: Storage,
{
    /// Creates an idle coordinator
    ///
    /// # Arguments
    ///
    /// * `settings` - Scope and behaviour for this organization
    /// * `fetcher` - Network access
    /// * `oracle` - robots.txt decisions
    /// * `extractor` - Link and metadata extraction
    /// * `storage` - Where pages, documents and links go
    /// * `interrupt` - Set to request a graceful stop between entries
    pub fn new(
        settings: CrawlSettings,
        fetcher: F,
        oracle: P,
        extractor: E,
        storage: S,
        interrupt: Arc<AtomicBool>,
    ) -> Self {
        let frontier = Frontier::new(settings.scope.clone());
        Self {
            settings,
            fetcher,
            oracle,
            extractor,
            storage,
            frontier,
            stats: CrawlStats::new(),
            state: CrawlState::Idle,
            interrupt,
            resumed_from: None,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs the crawl to a terminal state and reports on it
    ///
    /// Storage is always finalized with the report, whatever the outcome.
    pub async fn run(&mut self) -> CrawlReport {
        let started_at = Utc::now();
        tracing::info!(
            "Starting crawl of {} ({}, depth {}, {} pages)",
            self.settings.organization,
            self.settings.scope.base_domain,
            self.settings.scope.max_depth,
            self.settings.scope.max_pages
        );

        let (next, error) = match self.drive().await {
            Ok(next) => (next, None),
            Err(e) => {
                tracing::error!("Crawl of {} failed: {}", self.settings.organization, e);
                (CrawlState::Failed, Some(e.to_string()))
            }
        };
        if let Err(e) = self.state.transition(next) {
            tracing::warn!("{}", e);
        }

        let report = CrawlReport {
            organization: self.settings.organization.clone(),
            state: self.state,
            error,
            stats: self.stats.snapshot(),
            frontier: self.frontier.stats(),
            pending: self.frontier.len(),
            started_at,
            finished_at: Utc::now(),
            resumed_from: self.resumed_from,
        };

        if let Err(e) = self.storage.finalize(&report) {
            tracing::warn!("Failed to finalize storage: {}", e);
            self.stats.record_storage_error();
        }

        tracing::info!(
            "Crawl of {} ended {}: {} visited, {} pending",
            report.organization,
            report.state,
            report.frontier.visited,
            report.pending
        );
        report
    }

    /// Runs the lifecycle and returns the terminal state to move to
    async fn drive(&mut self) -> Result<CrawlState> {
        self.state.transition(CrawlState::Running)?;

        self.storage.initialize()?;
        self.restore()?;
        self.seed();

        let mut processed: u64 = 0;
        loop {
            if self.interrupt.load(Ordering::SeqCst) {
                tracing::info!("Interrupted, saving progress");
                self.save_checkpoint();
                return Ok(CrawlState::Paused);
            }

            if self.frontier.budget_exhausted() {
                tracing::info!("Page budget of {} reached", self.settings.scope.max_pages);
                break;
            }

            let Some(entry) = self.frontier.dequeue() else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            if self.frontier.is_visited(&entry.url) {
                tracing::debug!("Already visited: {}", entry.url);
                continue;
            }

            self.process_entry(entry).await;

            processed += 1;
            if processed % PROGRESS_INTERVAL == 0 {
                let snapshot = self.stats.snapshot();
                tracing::info!(
                    "Progress: {} visited, {} pending, {} ok, {} failed, {} documents",
                    self.frontier.visited_count(),
                    self.frontier.len(),
                    snapshot.requests_succeeded,
                    snapshot.requests_failed,
                    snapshot.documents_saved
                );
            }
        }

        self.save_checkpoint();
        Ok(CrawlState::Completed)
    }

    /// Loads the checkpoint into the frontier when resuming
    ///
    /// Also makes sure the checkpoint directory is usable, so a bad location
    /// fails the crawl up front instead of losing every save later.
    fn restore(&mut self) -> Result<()> {
        let Some(path) = self.settings.checkpoint_path.clone() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        if !self.settings.resume {
            return Ok(());
        }

        match checkpoint::load(&path) {
            Ok(saved) => {
                self.frontier.import_state(saved.frontier)?;
                self.stats = CrawlStats::from_snapshot(&saved.stats);
                self.resumed_from = Some(saved.saved_at);
                tracing::info!(
                    "Resumed from checkpoint saved at {} ({} pending, {} visited)",
                    saved.saved_at,
                    self.frontier.len(),
                    self.frontier.visited_count()
                );
                Ok(())
            }
            Err(CheckpointError::NotFound(_)) => {
                tracing::info!("No checkpoint at {}, starting fresh", path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Enqueues the seeds unless a restored frontier still has work
    fn seed(&mut self) {
        if !self.frontier.is_empty() {
            tracing::debug!("Pending entries restored, not seeding");
            return;
        }

        for seed in &self.settings.seeds {
            let outcome = self.frontier.enqueue(seed, 0, None, SEED_PRIORITY);
            tracing::debug!("Seed {}: {:?}", seed, outcome);
        }
    }

    async fn process_entry(&mut self, entry: FrontierEntry) {
        let url = match entry.url.to_url() {
            Ok(url) => url,
            Err(rejected) => {
                self.frontier.mark_failed(&entry.url, rejected.to_string());
                self.frontier.mark_visited(&entry.url);
                return;
            }
        };

        let mut delay = self.settings.request_delay;
        if self.settings.respect_robots_txt {
            if !self.oracle.can_fetch(&url).await {
                tracing::info!("Blocked by robots.txt: {}", entry.url);
                self.frontier.mark_visited(&entry.url);
                self.stats.record_denied();
                return;
            }
            if let Some(crawl_delay) = self.oracle.crawl_delay(&url) {
                delay = delay.max(crawl_delay);
            }
        }

        pause(delay).await;

        tracing::debug!("Fetching {} (depth {})", entry.url, entry.depth);
        self.stats.record_request();

        match self.fetcher.fetch(&url).await {
            Ok(content) => {
                self.stats.record_success();
                self.frontier.mark_visited(&entry.url);

                if self.settings.is_document(&content.content_type, &content.url) {
                    self.process_document(&entry, &content);
                } else if content.is_html() {
                    self.process_html(&entry, &content);
                } else {
                    tracing::debug!(
                        "Ignoring {} with content type '{}'",
                        entry.url,
                        content.content_type
                    );
                }

                if self.stats.requests_succeeded() % self.settings.checkpoint_interval == 0 {
                    self.save_checkpoint();
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", entry.url, e);
                self.stats.record_failure();
                self.frontier.mark_failed(&entry.url, e.to_string());
                self.frontier.mark_visited(&entry.url);
                pause(self.settings.error_delay).await;
            }
        }
    }

    fn process_html(&mut self, entry: &FrontierEntry, content: &FetchedContent) {
        let html = content.text();
        if html.chars().count() < self.settings.min_content_length {
            tracing::debug!("Page too short, skipping: {}", entry.url);
            return;
        }
        self.stats.record_page_processed();

        if self.settings.save_html {
            let metadata = self.extractor.extract_metadata(&html);
            match self.storage.save_page(
                entry.url.as_str(),
                &content.bytes,
                &content.encoding,
                &metadata,
            ) {
                Ok(Some(_)) => self.stats.record_page_saved(),
                Ok(None) => {}
                Err(e) => self.storage_failed("save page", &entry.url, e),
            }
        }

        let mut accepted = 0;

        // Documents first, so a document also linked as a page keeps the
        // parent's depth and document priority
        let documents = self.extractor.extract_document_links(
            &html,
            &content.url,
            &self.settings.download_extensions,
        );
        for document in &documents {
            if self.settings.rules.is_excluded(&document.url) {
                continue;
            }
            let outcome = self.frontier.enqueue(
                &document.url,
                entry.depth,
                Some(&entry.url),
                DOCUMENT_PRIORITY,
            );
            if outcome.is_accepted() {
                accepted += 1;
            }
        }

        let links = self.extractor.extract_links(&html, &content.url);
        self.stats.record_links(links.len());
        if !links.is_empty() {
            if let Err(e) = self.storage.add_links(entry.url.as_str(), &links) {
                self.storage_failed("record links from", &entry.url, e);
            }
        }

        let next_depth = entry.depth + 1;
        for link in &links {
            if link.kind == LinkKind::External && !self.settings.follow_external_links {
                continue;
            }
            if self.settings.rules.is_excluded(&link.url) {
                tracing::debug!("Excluded: {}", link.url);
                continue;
            }
            let priority = self.settings.rules.priority_for(&link.url);
            if self
                .frontier
                .enqueue(&link.url, next_depth, Some(&entry.url), priority)
                .is_accepted()
            {
                accepted += 1;
            }
        }

        tracing::debug!(
            "{}: {} links, {} documents, {} new entries",
            entry.url,
            links.len(),
            documents.len(),
            accepted
        );
    }

    fn process_document(&mut self, entry: &FrontierEntry, content: &FetchedContent) {
        if !self.settings.save_documents {
            tracing::debug!("Document saving disabled, skipping {}", entry.url);
            return;
        }

        match self
            .storage
            .save_document(entry.url.as_str(), &content.bytes, &content.content_type)
        {
            Ok(Some(path)) => {
                self.stats.record_document_saved();
                tracing::info!("Saved document {} -> {}", entry.url, path.display());
            }
            Ok(None) => tracing::debug!("Duplicate document: {}", entry.url),
            Err(e) => self.storage_failed("save document", &entry.url, e),
        }
    }

    fn storage_failed(&self, action: &str, url: &CanonicalUrl, error: StorageError) {
        tracing::warn!("Failed to {} {}: {}", action, url, error);
        self.stats.record_storage_error();
    }

    /// Best-effort checkpoint; failures are logged and the crawl goes on
    fn save_checkpoint(&self) {
        let Some(path) = &self.settings.checkpoint_path else {
            return;
        };
        match checkpoint::save(&self.frontier, self.stats.snapshot(), path) {
            Ok(saved_at) => tracing::debug!("Checkpoint saved at {}", saved_at),
            Err(e) => tracing::warn!("Failed to save checkpoint: {}", e),
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
