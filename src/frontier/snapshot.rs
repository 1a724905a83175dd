use super::{CrawlScope, Fingerprint, FrontierEntry};
use crate::url::CanonicalUrl;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Frontier counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierStats {
    /// URLs accepted into the pending queue
    pub queued: u64,

    /// URLs that completed a fetch attempt (or were denied by robots.txt)
    pub visited: u64,

    /// URLs whose fetch attempt failed
    pub failed: u64,

    /// Enqueue attempts rejected as invalid or out of scope
    pub skipped: u64,

    /// Enqueue attempts for already known URLs
    pub duplicates: u64,
}

/// Point-in-time copy of the complete frontier state
///
/// Collections are stored in a deterministic order: fingerprints and the
/// visited set sorted, the pending queue in dequeue order. Every field
/// defaults so that snapshots written by older versions still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierSnapshot {
    pub scope: Option<CrawlScope>,
    pub fingerprints: Vec<Fingerprint>,
    pub pending: Vec<FrontierEntry>,
    pub visited: Vec<CanonicalUrl>,
    pub failed: BTreeMap<CanonicalUrl, String>,
    pub stats: FrontierStats,
}
