//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing and link extraction
//! - Per-organization crawl coordination
//! - Running every configured organization in turn

mod coordinator;
mod fetcher;
mod parser;
mod settings;
mod stats;
mod traits;

pub use coordinator::Coordinator;
pub use fetcher::{
    build_http_client, charset_from_content_type, detect_encoding, HttpFetcher, RetryPolicy,
};
pub use parser::HtmlExtractor;
pub use settings::CrawlSettings;
pub use stats::{CrawlReport, CrawlStats, CrawlStatsSnapshot};
pub use traits::{
    ContentExtractor, DocumentLink, ExtractedLink, FetchError, FetchErrorKind, FetchedContent,
    Fetcher, LinkKind, PageMetadata, PermissionOracle,
};

use crate::checkpoint;
use crate::config::{Config, OrganizationConfig};
use crate::output::OrganizationLog;
use crate::robots::RobotsOracle;
use crate::storage::FileStore;
use crate::Result;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Pause between two organizations
const ORGANIZATION_PAUSE: Duration = Duration::from_secs(5);

/// How a crawl invocation treats existing checkpoints
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Continue from each organization's checkpoint if present
    pub resume: bool,

    /// Delete checkpoints before crawling
    pub fresh: bool,

    /// Restrict the crawl to these organization names (case-insensitive)
    pub only: Vec<String>,

    /// Log file switched to each organization in turn
    pub log_file: Option<OrganizationLog>,
}

/// Selects the organizations to crawl, in scrape-priority order
pub fn selected_organizations<'a>(
    config: &'a Config,
    only: &[String],
) -> Vec<&'a OrganizationConfig> {
    for name in only {
        if !config
            .organizations
            .iter()
            .any(|org| org.name.eq_ignore_ascii_case(name))
        {
            tracing::warn!("No organization named '{}' in the configuration", name);
        }
    }

    config
        .organizations_in_order()
        .into_iter()
        .filter(|org| only.is_empty() || only.iter().any(|n| org.name.eq_ignore_ascii_case(n)))
        .collect()
}

/// Crawls every selected organization, one after another
///
/// A failure for one organization is logged and recorded in its report;
/// the next organization still runs. Stops early once `interrupt` is set.
/// With `options.log_file`, each organization's events also go to
/// `<log-dir>/<org>_<timestamp>.log`.
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `options` - Resume/fresh handling and organization filter
/// * `interrupt` - Shared flag set on Ctrl-C
///
/// # Returns
///
/// One report per organization that was started
pub async fn crawl(
    config: &Config,
    options: &CrawlOptions,
    interrupt: Arc<AtomicBool>,
) -> Vec<CrawlReport> {
    let organizations = selected_organizations(config, &options.only);
    tracing::info!("Crawling {} organizations", organizations.len());

    let mut reports = Vec::with_capacity(organizations.len());
    for (i, org) in organizations.iter().enumerate() {
        if interrupt.load(Ordering::SeqCst) {
            tracing::info!("Interrupted, skipping remaining organizations");
            break;
        }

        if let Some(log) = &options.log_file {
            match log.start(Path::new(&config.logging.log_dir), &org.name) {
                Ok(path) => tracing::info!("Logging {} to {}", org.name, path.display()),
                Err(e) => tracing::warn!("Could not open log file for {}: {}", org.name, e),
            }
        }

        tracing::info!(
            "[{}/{}] {} ({} seeds)",
            i + 1,
            organizations.len(),
            org.name,
            org.seeds.len()
        );

        let report = match crawl_organization(config, org, options, interrupt.clone()).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Could not crawl {}: {}", org.name, e);
                CrawlReport::failed(&org.name, e.to_string())
            }
        };
        reports.push(report);

        if let Some(log) = &options.log_file {
            log.finish();
        }

        if i + 1 < organizations.len() && !interrupt.load(Ordering::SeqCst) {
            tokio::time::sleep(ORGANIZATION_PAUSE).await;
        }
    }

    reports
}

/// Builds the concrete collaborators for one organization and runs it
pub async fn crawl_organization(
    config: &Config,
    org: &OrganizationConfig,
    options: &CrawlOptions,
    interrupt: Arc<AtomicBool>,
) -> Result<CrawlReport> {
    let settings = CrawlSettings::for_organization(config, org, options.resume)?;

    if options.fresh {
        if let Some(path) = &settings.checkpoint_path {
            if checkpoint::discard(path)? {
                tracing::info!("Discarded checkpoint {}", path.display());
            }
        }
    }

    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.rate_limiting)?;
    let oracle = RobotsOracle::new(fetcher.client().clone(), &config.user_agent.crawler_name);
    let extractor = HtmlExtractor::new(settings.scope.base_domain.clone());
    let storage = FileStore::new(
        Path::new(&config.output.data_dir),
        &org.name,
        config.crawler.check_content_hash,
    );

    let mut coordinator =
        Coordinator::new(settings, fetcher, oracle, extractor, storage, interrupt);
    Ok(coordinator.run().await)
}
