//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Bounded retries with exponential backoff for transient failures
//! - Error classification into [`FetchErrorKind`]
//! - Charset detection from the Content-Type header, falling back to the body

use super::traits::{FetchError, FetchErrorKind, FetchedContent, Fetcher};
use crate::config::{RateLimitConfig, UserAgentConfig};
use async_trait::async_trait;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use url::Url;

/// How failed requests are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry; doubled for each further retry
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff),
        }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total time allowed for one request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use orgcrawl::config::UserAgentConfig;
/// use orgcrawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "OrgCrawl".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Builds a fetcher from the user agent and rate limiting sections
    pub fn from_config(
        user_agent: &UserAgentConfig,
        rate_limiting: &RateLimitConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, Duration::from_secs(rate_limiting.timeout))?;
        Ok(Self::new(client, RetryPolicy::from_config(rate_limiting)))
    }

    /// The underlying client, shared with the robots.txt oracle
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchedContent, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FetchErrorKind::Status(status.as_u16()),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        let final_url = response.url().clone();
        let content_type = header_content_type(&response);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::new(FetchErrorKind::Body, e.to_string()))?;
        let encoding = detect_encoding(&content_type, &bytes, final_url.host_str());

        Ok(FetchedContent {
            url: final_url,
            status: status.as_u16(),
            content_type,
            encoding,
            bytes: bytes.to_vec(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Fetches a URL with retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Timeout | Retry with backoff |
    /// | Connection error | Retry with backoff |
    /// | HTTP 429 / 5xx | Retry with backoff |
    /// | Other HTTP status | Immediate failure |
    /// | Body read error | Immediate failure |
    async fn fetch(&self, url: &Url) -> Result<FetchedContent, FetchError> {
        let mut attempt = 0;
        loop {
            tracing::debug!("Fetching {} (attempt {})", url, attempt + 1);
            match self.fetch_once(url).await {
                Ok(content) => return Ok(content),
                Err(err) if err.retryable && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::debug!(
                        "Retrying {} in {}ms after {}",
                        url,
                        delay.as_millis(),
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::new(FetchErrorKind::Timeout, "Request timeout")
    } else if e.is_connect() {
        FetchError::new(FetchErrorKind::Connect, e.to_string())
    } else {
        FetchError::new(FetchErrorKind::Request, e.to_string())
    }
}

fn header_content_type(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase()
}

/// Extracts the charset parameter from a Content-Type value
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            if key.trim().eq_ignore_ascii_case("charset") {
                Some(value.trim().trim_matches('"').to_lowercase())
            } else {
                None
            }
        })
        .find(|charset| !charset.is_empty())
}

/// Picks the encoding label for a response body
///
/// A declared charset wins if it names a known encoding. Otherwise a byte
/// order mark or valid UTF-8 decides, and other text bodies are guessed
/// from their bytes, using the host's top-level domain as a hint. Binary
/// bodies are labelled `utf-8`.
///
/// # Arguments
///
/// * `content_type` - Lowercased Content-Type header value
/// * `bytes` - Response body
/// * `host` - Host the body came from
pub fn detect_encoding(content_type: &str, bytes: &[u8], host: Option<&str>) -> String {
    if let Some(label) = charset_from_content_type(content_type) {
        if Encoding::for_label(label.as_bytes()).is_some() {
            return label;
        }
        tracing::debug!("Unknown charset '{}', detecting from body", label);
    }

    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding.name().to_lowercase();
    }

    let is_text = content_type.is_empty()
        || content_type.starts_with("text/")
        || content_type.contains("xml");
    if !is_text || std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let tld = host.and_then(|h| h.rsplit('.').next()).map(str::as_bytes);
    detector.guess(tld, true).name().to_lowercase()
}
