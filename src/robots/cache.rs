//! Per-origin robots.txt cache with 24 hour expiry

use crate::robots::RobotsRules;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// robots.txt rules and when they were fetched
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub rules: RobotsRules,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(rules: RobotsRules) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached robots.txt is older than `ttl`
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// Cache keyed by origin (`scheme://host:port`)
#[derive(Debug)]
pub struct RobotsCache {
    entries: HashMap<String, CachedRobots>,
    ttl: Duration,
}

impl Default for RobotsCache {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

impl RobotsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Fresh rules for `origin`, or `None` if missing or expired
    pub fn get(&self, origin: &str) -> Option<&RobotsRules> {
        self.entries
            .get(origin)
            .filter(|cached| !cached.is_stale(self.ttl))
            .map(|cached| &cached.rules)
    }

    pub fn insert(&mut self, origin: impl Into<String>, rules: RobotsRules) {
        self.entries.insert(origin.into(), CachedRobots::new(rules));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn backdate(&mut self, origin: &str, by: Duration) {
        if let Some(cached) = self.entries.get_mut(origin) {
            cached.fetched_at = cached.fetched_at - by;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://example.org";

    #[test]
    fn test_new_entry_not_stale() {
        let cached = CachedRobots::new(RobotsRules::allow_all());
        assert!(!cached.is_stale(Duration::hours(24)));
    }

    #[test]
    fn test_get_fresh_entry() {
        let mut cache = RobotsCache::default();
        assert!(cache.get(ORIGIN).is_none());

        cache.insert(ORIGIN, RobotsRules::from_body("User-agent: *\nDisallow: /"));
        assert_eq!(cache.len(), 1);
        assert!(!cache.get(ORIGIN).unwrap().is_allow_all());
    }

    #[test]
    fn test_expired_entry_is_ignored() {
        let mut cache = RobotsCache::default();
        cache.insert(ORIGIN, RobotsRules::allow_all());

        cache.backdate(ORIGIN, Duration::hours(23));
        assert!(cache.get(ORIGIN).is_some());

        cache.backdate(ORIGIN, Duration::hours(2));
        assert!(cache.get(ORIGIN).is_none());
    }

    #[test]
    fn test_origins_are_separate() {
        let mut cache = RobotsCache::default();
        cache.insert(ORIGIN, RobotsRules::allow_all());
        assert!(cache.get("http://example.org").is_none());
    }
}
