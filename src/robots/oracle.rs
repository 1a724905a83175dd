use crate::crawler::PermissionOracle;
use crate::robots::{RobotsCache, RobotsRules};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// robots.txt backed [`PermissionOracle`]
///
/// Fetches `/robots.txt` once per origin and caches it. A missing file
/// (4xx) or an unreachable one allows everything; a 5xx is treated the same
/// way rather than blocking the whole site.
pub struct RobotsOracle {
    client: Client,
    agent: String,
    cache: RobotsCache,
}

impl RobotsOracle {
    /// # Arguments
    ///
    /// * `client` - HTTP client, normally the fetcher's
    /// * `agent` - Product token matched against `User-agent` lines
    pub fn new(client: Client, agent: impl Into<String>) -> Self {
        Self {
            client,
            agent: agent.into(),
            cache: RobotsCache::default(),
        }
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Rules for the origin of `url`, fetching them if not cached
    pub async fn rules_for(&mut self, url: &Url) -> RobotsRules {
        let origin = origin_of(url);
        if let Some(rules) = self.cache.get(&origin) {
            return rules.clone();
        }

        let rules = self.fetch_rules(&origin).await;
        self.cache.insert(origin, rules.clone());
        rules
    }

    async fn fetch_rules(&self, origin: &str) -> RobotsRules {
        let robots_url = format!("{}/robots.txt", origin);
        tracing::debug!("Fetching {}", robots_url);

        let response = match self.client.get(&robots_url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Could not fetch {}: {}, allowing all", robots_url, e);
                return RobotsRules::allow_all();
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} returned {}, allowing all", robots_url, status);
            return RobotsRules::allow_all();
        }

        match response.text().await {
            Ok(body) => RobotsRules::from_body(&body),
            Err(e) => {
                tracing::warn!("Could not read {}: {}, allowing all", robots_url, e);
                RobotsRules::allow_all()
            }
        }
    }
}

#[async_trait]
impl PermissionOracle for RobotsOracle {
    async fn can_fetch(&mut self, url: &Url) -> bool {
        let rules = self.rules_for(url).await;
        rules.is_allowed(&self.agent, url.as_str())
    }

    fn crawl_delay(&self, url: &Url) -> Option<Duration> {
        self.cache
            .get(&origin_of(url))
            .and_then(|rules| rules.crawl_delay(&self.agent))
    }
}

/// `scheme://host[:port]` of a URL
fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_of() {
        let url = Url::parse("https://Example.org:8443/a/b?c=d").unwrap();
        assert_eq!(origin_of(&url), "https://example.org:8443");

        let url = Url::parse("http://example.org/").unwrap();
        assert_eq!(origin_of(&url), "http://example.org");
    }

    #[test]
    fn test_crawl_delay_before_fetch_is_none() {
        let oracle = RobotsOracle::new(Client::new(), "OrgCrawler");
        let url = Url::parse("https://example.org/").unwrap();
        assert_eq!(oracle.crawl_delay(&url), None);
        assert_eq!(oracle.agent(), "OrgCrawler");
    }
}
