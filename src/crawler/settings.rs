use crate::checkpoint::checkpoint_path;
use crate::config::{Config, OrganizationConfig};
use crate::frontier::CrawlScope;
use crate::url::{canonicalize, UrlRules};
use crate::{ConfigError, ConfigResult};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Immutable per-organization crawl settings
///
/// Built once from the global config and the organization entry, then
/// handed to the coordinator. Nothing here changes during a crawl.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub organization: String,
    pub seeds: Vec<String>,
    pub scope: CrawlScope,

    /// Pause before every request
    pub request_delay: Duration,

    /// Extra pause after a failed request
    pub error_delay: Duration,

    /// Successful fetches between checkpoints
    pub checkpoint_interval: u64,

    /// None disables checkpointing
    pub checkpoint_path: Option<PathBuf>,

    /// Load the checkpoint before seeding
    pub resume: bool,

    pub follow_external_links: bool,
    pub respect_robots_txt: bool,
    pub min_content_length: usize,
    pub save_html: bool,
    pub save_documents: bool,
    pub download_extensions: Vec<String>,
    pub document_types: Vec<String>,
    pub rules: UrlRules,
}

impl CrawlSettings {
    /// Builds settings for one organization
    ///
    /// The base domain is the host of the first seed. Per-organization
    /// depth and page limits override the crawler defaults.
    pub fn for_organization(
        config: &Config,
        org: &OrganizationConfig,
        resume: bool,
    ) -> ConfigResult<Self> {
        let first_seed = org.seeds.first().ok_or_else(|| {
            ConfigError::Validation(format!("Organization '{}' has no seed URLs", org.name))
        })?;
        let seed = canonicalize(first_seed, None).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", first_seed, e))
        })?;

        let max_depth = org.max_depth.unwrap_or(config.crawler.max_depth);
        let max_pages = org.max_pages.unwrap_or(config.crawler.max_pages);
        let scope = CrawlScope::from_seed(&seed, max_depth, max_pages).ok_or_else(|| {
            ConfigError::InvalidUrl(format!("Seed URL '{}' has no host", first_seed))
        })?;

        let checkpoint_path = if config.session.save_progress {
            Some(checkpoint_path(
                &PathBuf::from(&config.session.checkpoint_dir),
                &org.name,
            ))
        } else {
            None
        };

        Ok(Self {
            organization: org.name.clone(),
            seeds: org.seeds.clone(),
            scope,
            request_delay: Duration::from_millis(config.rate_limiting.delay_between_requests),
            error_delay: Duration::from_millis(config.rate_limiting.delay_on_error),
            checkpoint_interval: config.session.checkpoint_interval.max(1),
            checkpoint_path,
            resume: resume && config.session.save_progress,
            follow_external_links: config.crawler.follow_external_links,
            respect_robots_txt: config.crawler.respect_robots_txt,
            min_content_length: config.crawler.min_content_length,
            save_html: config.output.save_html,
            save_documents: config.output.save_documents,
            download_extensions: config.download_extensions.clone(),
            document_types: config.document_types.clone(),
            rules: UrlRules::from_config(&config.filters),
        })
    }

    /// Returns true if a response is a document rather than a page
    ///
    /// Either the content type contains a configured document type or the
    /// URL path ends with a download extension.
    pub fn is_document(&self, content_type: &str, url: &Url) -> bool {
        let content_type = content_type.to_lowercase();
        if self
            .document_types
            .iter()
            .any(|t| content_type.contains(&t.to_lowercase()))
        {
            return true;
        }

        let path = url.path().to_lowercase();
        self.download_extensions
            .iter()
            .any(|ext| path.ends_with(&ext.to_lowercase()))
    }
}
