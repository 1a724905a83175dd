//! robots.txt rules for one host
//!
//! Allow/Disallow matching is delegated to the `robotstxt` crate. That crate
//! ignores `Crawl-delay`, so the delay is read from the groups here.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Longest crawl-delay honoured; larger values are capped to this
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// Parsed robots.txt for a single origin
#[derive(Debug, Clone, PartialEq)]
pub struct RobotsRules {
    /// Raw file body; `None` means everything is allowed
    body: Option<String>,
}

impl RobotsRules {
    /// Rules from a fetched robots.txt body
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return Self::allow_all();
        }
        Self {
            body: Some(body.to_string()),
        }
    }

    /// Permissive rules, used when robots.txt is missing or unreachable
    pub fn allow_all() -> Self {
        Self { body: None }
    }

    pub fn is_allow_all(&self) -> bool {
        self.body.is_none()
    }

    /// Checks whether `agent` may fetch the absolute `url`
    ///
    /// # Arguments
    ///
    /// * `agent` - Product token, e.g. `OrgCrawler`
    /// * `url` - Full URL being requested
    pub fn is_allowed(&self, agent: &str, url: &str) -> bool {
        match &self.body {
            None => true,
            Some(body) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, agent, url)
            }
        }
    }

    /// Crawl-delay for `agent`, falling back to the `*` group
    ///
    /// A group is a run of `User-agent` lines followed by its rules. A group
    /// naming the agent wins over the wildcard group. Values above
    /// [`MAX_CRAWL_DELAY`] are capped.
    pub fn crawl_delay(&self, agent: &str) -> Option<Duration> {
        let body = self.body.as_ref()?;
        let agent = agent.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut specific: Option<f64> = None;
        let mut wildcard: Option<f64> = None;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(seconds) = value.parse::<f64>() else {
                        continue;
                    };
                    if seconds.is_nan() || seconds < 0.0 {
                        continue;
                    }
                    if group.iter().any(|ua| *ua == agent) {
                        specific.get_or_insert(seconds);
                    } else if group.iter().any(|ua| ua == "*") {
                        wildcard.get_or_insert(seconds);
                    }
                }
                _ => in_rules = true,
            }
        }

        specific.or(wildcard).map(capped_delay)
    }
}

fn capped_delay(seconds: f64) -> Duration {
    match Duration::try_from_secs_f64(seconds) {
        Ok(delay) if delay <= MAX_CRAWL_DELAY => delay,
        _ => {
            tracing::warn!(
                "Crawl-delay of {}s capped to {}s",
                seconds,
                MAX_CRAWL_DELAY.as_secs()
            );
            MAX_CRAWL_DELAY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = "OrgCrawler";

    #[test]
    fn test_allow_all() {
        let rules = RobotsRules::allow_all();
        assert!(rules.is_allow_all());
        assert!(rules.is_allowed(AGENT, "https://example.org/admin"));
        assert_eq!(rules.crawl_delay(AGENT), None);
    }

    #[test]
    fn test_empty_body_allows_all() {
        assert!(RobotsRules::from_body("  \n").is_allow_all());
    }

    #[test]
    fn test_disallow_prefix() {
        let rules = RobotsRules::from_body("User-agent: *\nDisallow: /private");
        assert!(rules.is_allowed(AGENT, "https://example.org/"));
        assert!(rules.is_allowed(AGENT, "https://example.org/about"));
        assert!(!rules.is_allowed(AGENT, "https://example.org/private"));
        assert!(!rules.is_allowed(AGENT, "https://example.org/private/x?y=1"));
    }

    #[test]
    fn test_allow_overrides_longer_match() {
        let rules =
            RobotsRules::from_body("User-agent: *\nDisallow: /docs\nAllow: /docs/public");
        assert!(!rules.is_allowed(AGENT, "https://example.org/docs/internal"));
        assert!(rules.is_allowed(AGENT, "https://example.org/docs/public/a"));
    }

    #[test]
    fn test_agent_specific_group() {
        let body = "User-agent: OrgCrawler\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let rules = RobotsRules::from_body(body);
        assert!(!rules.is_allowed(AGENT, "https://example.org/page"));
        assert!(rules.is_allowed("OtherBot", "https://example.org/page"));
    }

    #[test]
    fn test_garbage_body_allows() {
        let rules = RobotsRules::from_body("<html>not found</html>");
        assert!(rules.is_allowed(AGENT, "https://example.org/any"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let rules = RobotsRules::from_body("User-agent: *\nCrawl-delay: 4\nDisallow: /x");
        assert_eq!(rules.crawl_delay(AGENT), Some(Duration::from_secs(4)));
    }

    #[test]
    fn test_crawl_delay_specific_wins() {
        let body = "User-agent: *\nCrawl-delay: 10\n\nUser-agent: orgcrawler\nCrawl-delay: 1.5";
        let rules = RobotsRules::from_body(body);
        assert_eq!(rules.crawl_delay(AGENT), Some(Duration::from_millis(1500)));
        assert_eq!(rules.crawl_delay("OtherBot"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_shared_group() {
        let body = "User-agent: A\nUser-agent: OrgCrawler\nDisallow: /tmp\nCrawl-delay: 3\n\nUser-agent: B\nCrawl-delay: 9";
        let rules = RobotsRules::from_body(body);
        assert_eq!(rules.crawl_delay(AGENT), Some(Duration::from_secs(3)));
        assert_eq!(rules.crawl_delay("C"), None);
    }

    #[test]
    fn test_crawl_delay_invalid_values_ignored() {
        let rules = RobotsRules::from_body("User-agent: *\nCrawl-delay: soon\nCrawl-delay: -2");
        assert_eq!(rules.crawl_delay(AGENT), None);
    }

    #[test]
    fn test_crawl_delay_above_cap_is_capped() {
        let rules = RobotsRules::from_body("User-agent: *\nCrawl-delay: 86400");
        assert_eq!(rules.crawl_delay(AGENT), Some(MAX_CRAWL_DELAY));
    }

    #[test]
    fn test_crawl_delay_too_large_for_duration() {
        let rules = RobotsRules::from_body("User-agent: *\nCrawl-delay: 1e30\nDisallow: /x");
        assert_eq!(rules.crawl_delay(AGENT), Some(MAX_CRAWL_DELAY));

        let rules = RobotsRules::from_body("User-agent: *\nCrawl-delay: inf");
        assert_eq!(rules.crawl_delay(AGENT), Some(MAX_CRAWL_DELAY));
    }

    #[test]
    fn test_crawl_delay_at_cap_kept() {
        let rules = RobotsRules::from_body("User-agent: *\nCrawl-delay: 60");
        assert_eq!(rules.crawl_delay(AGENT), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_crawl_delay_with_comment() {
        let rules = RobotsRules::from_body("User-agent: * # everyone\nCrawl-delay: 2 # be nice");
        assert_eq!(rules.crawl_delay(AGENT), Some(Duration::from_secs(2)));
    }
}
