use serde::{Deserialize, Serialize};

/// Main configuration structure for orgcrawl
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "rate-limiting")]
    pub rate_limiting: RateLimitConfig,
    pub session: SessionConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    /// URL suffixes that identify downloadable documents
    #[serde(rename = "download-extensions", default = "default_download_extensions")]
    pub download_extensions: Vec<String>,

    /// Content-type fragments that identify documents
    #[serde(rename = "document-types", default = "default_document_types")]
    pub document_types: Vec<String>,

    #[serde(rename = "organization", default)]
    pub organizations: Vec<OrganizationConfig>,
}

impl Config {
    /// Organizations in crawl order (ascending scrape priority, then file order)
    pub fn organizations_in_order(&self) -> Vec<&OrganizationConfig> {
        let mut orgs: Vec<&OrganizationConfig> = self.organizations.iter().collect();
        // sort_by_key is stable, equal priorities keep file order
        orgs.sort_by_key(|org| org.scrape_priority);
        orgs
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from seed URLs
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of pages visited per organization
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Whether links to other sites are enqueued
    #[serde(rename = "follow-external-links", default)]
    pub follow_external_links: bool,

    #[serde(rename = "respect-robots-txt", default = "default_true")]
    pub respect_robots_txt: bool,

    /// HTML shorter than this many bytes is not saved or parsed
    #[serde(rename = "min-content-length", default)]
    pub min_content_length: usize,

    /// Skip saving content whose hash was already stored
    #[serde(rename = "check-content-hash", default = "default_true")]
    pub check_content_hash: bool,
}

/// Request pacing and retry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Minimum pause before every request (milliseconds)
    #[serde(rename = "delay-between-requests")]
    pub delay_between_requests: u64,

    /// Extra pause after a failed request (milliseconds)
    #[serde(rename = "delay-on-error")]
    pub delay_on_error: u64,

    /// Request timeout (seconds)
    pub timeout: u64,

    /// Retries after the first attempt for retryable failures
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential retry backoff (milliseconds)
    #[serde(rename = "retry-backoff", default = "default_retry_backoff")]
    pub retry_backoff: u64,
}

/// Checkpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Directory holding one checkpoint file per organization
    #[serde(rename = "checkpoint-dir")]
    pub checkpoint_dir: String,

    /// Successful fetches between checkpoints
    #[serde(rename = "checkpoint-interval")]
    pub checkpoint_interval: u64,

    /// Whether checkpoints are written and read at all
    #[serde(rename = "save-progress", default = "default_true")]
    pub save_progress: bool,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Full User-Agent header value
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Root directory for saved pages, documents and summaries
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    #[serde(rename = "save-html", default = "default_true")]
    pub save_html: bool,

    #[serde(rename = "save-documents", default = "default_true")]
    pub save_documents: bool,
}

/// Log file configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Write a DEBUG-level log file for each organization
    #[serde(rename = "file-output", default)]
    pub file_output: bool,

    /// Directory holding `<org>_<timestamp>.log` files
    #[serde(rename = "log-dir", default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_output: false,
            log_dir: default_log_dir(),
        }
    }
}

/// URL filtering rules
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Substrings that exclude a URL
    #[serde(default)]
    pub exclusions: Vec<String>,

    #[serde(default)]
    pub priority: PriorityPatterns,
}

/// Substring patterns mapped to priority levels 0, 1 and 2
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PriorityPatterns {
    #[serde(default)]
    pub high: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
    #[serde(default)]
    pub low: Vec<String>,
}

/// One organization to crawl
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrganizationConfig {
    /// Display name, also used for directory and checkpoint file names
    pub name: String,

    /// Seed URLs; the first one defines the base domain
    pub seeds: Vec<String>,

    /// Overrides `crawler.max-depth`
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,

    /// Overrides `crawler.max-pages`
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<usize>,

    /// Lower values are crawled first
    #[serde(rename = "scrape-priority", default = "default_scrape_priority")]
    pub scrape_priority: u32,
}

fn default_true() -> bool {
    true
}

fn default_log_dir() -> String {
    "data/logs".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    1000
}

fn default_scrape_priority() -> u32 {
    99
}

fn default_download_extensions() -> Vec<String> {
    [".pdf", ".doc", ".docx", ".xls", ".xlsx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_document_types() -> Vec<String> {
    [
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument",
        "application/vnd.ms-excel",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
