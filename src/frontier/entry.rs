use crate::url::CanonicalUrl;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierEntry {
    /// Caller-assigned ordering key, lower is sooner
    pub priority: u32,

    /// Distance from the seed URLs (seeds are depth 0)
    pub depth: u32,

    /// Canonical form of the URL
    pub url: CanonicalUrl,

    /// Page the URL was discovered on, if any
    #[serde(default)]
    pub parent: Option<CanonicalUrl>,
}

/// Heap element pairing an entry with its insertion sequence
///
/// `BinaryHeap` is a max-heap, so the ordering is reversed: the smallest
/// `(priority, depth, seq)` compares greatest and is popped first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueuedEntry {
    pub seq: u64,
    pub entry: FrontierEntry,
}

impl QueuedEntry {
    fn key(&self) -> (u32, u32, u64) {
        (self.entry.priority, self.entry.depth, self.seq)
    }
}

impl Ord for QueuedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for QueuedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
