use crate::url::{extract_domain, is_same_site, CanonicalUrl};
use serde::{Deserialize, Serialize};

/// Immutable limits for one crawl session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlScope {
    /// Domain whose host and subdomains count as internal
    pub base_domain: String,

    /// Deepest depth that may be enqueued (seeds are depth 0)
    pub max_depth: u32,

    /// Upper bound on visited URLs
    pub max_pages: usize,
}

impl CrawlScope {
    pub fn new(base_domain: impl Into<String>, max_depth: u32, max_pages: usize) -> Self {
        Self {
            base_domain: base_domain.into().to_lowercase(),
            max_depth,
            max_pages,
        }
    }

    /// Builds a scope whose base domain is the host of the first seed
    ///
    /// Returns None if the seed has no host.
    pub fn from_seed(seed: &CanonicalUrl, max_depth: u32, max_pages: usize) -> Option<Self> {
        let url = seed.to_url().ok()?;
        let domain = extract_domain(&url)?;
        Some(Self::new(domain, max_depth, max_pages))
    }

    /// Returns true if the host belongs to the crawl's site
    pub fn is_internal(&self, host: &str) -> bool {
        is_same_site(host, &self.base_domain)
    }
}
