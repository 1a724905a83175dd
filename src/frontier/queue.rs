use super::entry::QueuedEntry;
use super::{CrawlScope, Fingerprint, FrontierEntry, FrontierSnapshot, FrontierStats};
use crate::url::{canonicalize, CanonicalUrl};
use crate::{CrawlError, Rejected, Result};
use std::collections::{BTreeMap, BinaryHeap, HashSet};

/// Why an enqueue attempt did not add a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The URL could not be canonicalized
    Invalid(Rejected),

    /// The URL was enqueued before (pending or visited)
    Duplicate,

    /// The depth is greater than the scope allows
    DepthExceeded,

    /// The page budget is already used up
    BudgetExceeded,
}

/// Result of [`Frontier::enqueue`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Accepted(CanonicalUrl),
    Skipped(SkipReason),
}

impl EnqueueOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, EnqueueOutcome::Accepted(_))
    }
}

/// Crawl frontier for one organization
///
/// Owns the pending priority queue, the dedup index, the visited set and
/// the failed map. Every URL that enters is canonicalized first, so a URL
/// discovered in several forms is queued and fetched at most once.
#[derive(Debug)]
pub struct Frontier {
    scope: CrawlScope,
    pending: BinaryHeap<QueuedEntry>,
    seen: HashSet<Fingerprint>,
    visited: HashSet<CanonicalUrl>,
    failed: BTreeMap<CanonicalUrl, String>,
    next_seq: u64,
    queued: u64,
    skipped: u64,
    duplicates: u64,
}

impl Frontier {
    /// Creates an empty frontier for the given scope
    pub fn new(scope: CrawlScope) -> Self {
        Self {
            scope,
            pending: BinaryHeap::new(),
            seen: HashSet::new(),
            visited: HashSet::new(),
            failed: BTreeMap::new(),
            next_seq: 0,
            queued: 0,
            skipped: 0,
            duplicates: 0,
        }
    }

    pub fn scope(&self) -> &CrawlScope {
        &self.scope
    }

    /// Offers a URL to the frontier
    ///
    /// Checks run in a fixed order: canonicalization, dedup, depth, budget.
    /// The first failing check decides the skip reason.
    ///
    /// # Arguments
    ///
    /// * `raw` - URL as discovered, possibly relative to `parent`
    /// * `depth` - Depth to record for the entry
    /// * `parent` - Page the URL was found on, also the base for relative URLs
    /// * `priority` - Ordering key, lower is dequeued sooner
    pub fn enqueue(
        &mut self,
        raw: &str,
        depth: u32,
        parent: Option<&CanonicalUrl>,
        priority: u32,
    ) -> EnqueueOutcome {
        let url = match canonicalize(raw, parent) {
            Ok(url) => url,
            Err(rejected) => {
                self.skipped += 1;
                return EnqueueOutcome::Skipped(SkipReason::Invalid(rejected));
            }
        };

        let fingerprint = Fingerprint::of(&url);
        if self.seen.contains(&fingerprint) {
            self.duplicates += 1;
            return EnqueueOutcome::Skipped(SkipReason::Duplicate);
        }

        if depth > self.scope.max_depth {
            self.skipped += 1;
            return EnqueueOutcome::Skipped(SkipReason::DepthExceeded);
        }

        if self.budget_exhausted() {
            self.skipped += 1;
            return EnqueueOutcome::Skipped(SkipReason::BudgetExceeded);
        }

        self.seen.insert(fingerprint);
        self.pending.push(QueuedEntry {
            seq: self.next_seq,
            entry: FrontierEntry {
                priority,
                depth,
                url: url.clone(),
                parent: parent.cloned(),
            },
        });
        self.next_seq += 1;
        self.queued += 1;

        EnqueueOutcome::Accepted(url)
    }

    /// Removes and returns the entry with the lowest (priority, depth)
    ///
    /// Entries with equal keys come out in insertion order. The URL is not
    /// marked visited.
    pub fn dequeue(&mut self) -> Option<FrontierEntry> {
        self.pending.pop().map(|queued| queued.entry)
    }

    /// Records that a URL completed a fetch attempt
    ///
    /// Idempotent. Returns false without recording if the page budget is
    /// already used up by other URLs.
    pub fn mark_visited(&mut self, url: &CanonicalUrl) -> bool {
        if self.visited.contains(url) {
            return true;
        }

        if self.budget_exhausted() {
            tracing::warn!("Page budget exhausted, not recording visit to {}", url);
            return false;
        }

        self.seen.insert(Fingerprint::of(url));
        self.visited.insert(url.clone());
        true
    }

    /// Records the last failure for a URL; visited state is unchanged
    pub fn mark_failed(&mut self, url: &CanonicalUrl, error: impl Into<String>) {
        self.failed.insert(url.clone(), error.into());
    }

    pub fn is_visited(&self, url: &CanonicalUrl) -> bool {
        self.visited.contains(url)
    }

    /// Returns the recorded failure for a URL, if any
    pub fn failure(&self, url: &CanonicalUrl) -> Option<&str> {
        self.failed.get(url).map(String::as_str)
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of visited URLs
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Returns true once the visited count has reached the page budget
    pub fn budget_exhausted(&self) -> bool {
        self.visited.len() >= self.scope.max_pages
    }

    pub fn stats(&self) -> FrontierStats {
        FrontierStats {
            queued: self.queued,
            visited: self.visited.len() as u64,
            failed: self.failed.len() as u64,
            skipped: self.skipped,
            duplicates: self.duplicates,
        }
    }

    /// Takes a deep, deterministic copy of the frontier state
    pub fn export_state(&self) -> FrontierSnapshot {
        let mut fingerprints: Vec<Fingerprint> = self.seen.iter().copied().collect();
        fingerprints.sort();

        // into_sorted_vec is ascending under the reversed ordering, so the
        // next entry to dequeue is last
        let pending: Vec<FrontierEntry> = self
            .pending
            .clone()
            .into_sorted_vec()
            .into_iter()
            .rev()
            .map(|queued| queued.entry)
            .filter(|entry| !self.visited.contains(&entry.url))
            .collect();

        let mut visited: Vec<CanonicalUrl> = self.visited.iter().cloned().collect();
        visited.sort();

        FrontierSnapshot {
            scope: Some(self.scope.clone()),
            fingerprints,
            pending,
            visited,
            failed: self.failed.clone(),
            stats: self.stats(),
        }
    }

    /// Replaces the whole frontier state with a snapshot
    ///
    /// Fails with [`CrawlError::ScopeMismatch`] if the snapshot was taken
    /// under a different scope; the frontier is left untouched in that case.
    pub fn import_state(&mut self, snapshot: FrontierSnapshot) -> Result<()> {
        if let Some(scope) = &snapshot.scope {
            if *scope != self.scope {
                return Err(CrawlError::ScopeMismatch(format!(
                    "checkpoint has {} (depth {}, {} pages), config has {} (depth {}, {} pages)",
                    scope.base_domain,
                    scope.max_depth,
                    scope.max_pages,
                    self.scope.base_domain,
                    self.scope.max_depth,
                    self.scope.max_pages
                )));
            }
        }

        let mut seen: HashSet<Fingerprint> = snapshot.fingerprints.into_iter().collect();
        let visited: HashSet<CanonicalUrl> = snapshot.visited.into_iter().collect();

        let mut pending = BinaryHeap::with_capacity(snapshot.pending.len());
        let mut next_seq = 0;
        for entry in snapshot.pending {
            if visited.contains(&entry.url) {
                continue;
            }
            seen.insert(Fingerprint::of(&entry.url));
            pending.push(QueuedEntry {
                seq: next_seq,
                entry,
            });
            next_seq += 1;
        }
        for url in &visited {
            seen.insert(Fingerprint::of(url));
        }

        self.pending = pending;
        self.seen = seen;
        self.visited = visited;
        self.failed = snapshot.failed;
        self.next_seq = next_seq;
        self.queued = snapshot.stats.queued;
        self.skipped = snapshot.stats.skipped;
        self.duplicates = snapshot.stats.duplicates;

        Ok(())
    }
}
