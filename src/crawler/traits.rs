//! Collaborator interfaces used by the coordinator
//!
//! The coordinator only talks to the network, robots.txt and HTML through
//! these traits, so a crawl can run against in-memory fakes in tests.

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Body and metadata of a successful fetch
#[derive(Debug, Clone)]
pub struct FetchedContent {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status code
    pub status: u16,

    /// Lowercased Content-Type header value, empty if absent
    pub content_type: String,

    /// Character encoding label, declared by the server or detected
    pub encoding: String,

    /// Raw response body
    pub bytes: Vec<u8>,
}

impl FetchedContent {
    /// Returns true if the server declared an HTML body
    pub fn is_html(&self) -> bool {
        self.content_type.contains("text/html")
    }

    /// Decodes the body as text, replacing invalid sequences
    ///
    /// Unknown labels decode as UTF-8. A byte order mark overrides the label.
    pub fn text(&self) -> String {
        let encoding = Encoding::for_label(self.encoding.as_bytes()).unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(&self.bytes);
        text.into_owned()
    }
}

/// Classification of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request timed out
    Timeout,

    /// Connection could not be established (DNS, refused, TLS)
    Connect,

    /// The server answered with a non-success status
    Status(u16),

    /// The body could not be read
    Body,

    /// Any other request failure
    Request,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connect => write!(f, "connect"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Body => write!(f, "body"),
            Self::Request => write!(f, "request"),
        }
    }
}

/// A failed fetch, after any retries the fetcher performed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,

    /// Whether another attempt could plausibly succeed
    pub retryable: bool,

    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        let retryable = match kind {
            FetchErrorKind::Timeout | FetchErrorKind::Connect => true,
            FetchErrorKind::Status(code) => code == 429 || (500..600).contains(&code),
            FetchErrorKind::Body | FetchErrorKind::Request => false,
        };
        Self {
            kind,
            retryable,
            message: message.into(),
        }
    }
}

/// Fetches URLs over the network
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches one URL, retrying internally as configured
    async fn fetch(&self, url: &Url) -> Result<FetchedContent, FetchError>;
}

/// Decides whether a URL may be fetched (robots.txt)
#[async_trait]
pub trait PermissionOracle: Send {
    /// Returns true if the crawler may fetch `url`
    async fn can_fetch(&mut self, url: &Url) -> bool;

    /// Crawl delay requested by the site, if any
    ///
    /// Only meaningful after `can_fetch` was called for the same host.
    fn crawl_delay(&self, url: &Url) -> Option<Duration>;
}

/// Whether a link stays on the crawled site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Internal,
    External,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
        }
    }
}

/// A hyperlink found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedLink {
    /// Absolute URL
    pub url: String,
    pub anchor_text: String,
    pub kind: LinkKind,
}

/// A link to a downloadable document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLink {
    /// Absolute URL
    pub url: String,

    /// Extension without the dot, e.g. `pdf`
    pub doc_type: String,
}

/// Page-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Pulls links and metadata out of HTML
pub trait ContentExtractor {
    /// Extracts followable links, resolved against `base`
    fn extract_links(&self, html: &str, base: &Url) -> Vec<ExtractedLink>;

    /// Extracts links whose path ends with one of `extensions`
    fn extract_document_links(&self, html: &str, base: &Url, extensions: &[String])
        -> Vec<DocumentLink>;

    fn extract_metadata(&self, _html: &str) -> PageMetadata {
        PageMetadata::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_retryable() {
        assert!(FetchError::new(FetchErrorKind::Timeout, "t").retryable);
        assert!(FetchError::new(FetchErrorKind::Connect, "c").retryable);
        assert!(FetchError::new(FetchErrorKind::Status(503), "s").retryable);
        assert!(FetchError::new(FetchErrorKind::Status(429), "s").retryable);
        assert!(!FetchError::new(FetchErrorKind::Status(404), "s").retryable);
        assert!(!FetchError::new(FetchErrorKind::Body, "b").retryable);
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::new(FetchErrorKind::Status(500), "Internal Server Error");
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
    }

    #[test]
    fn test_fetched_content_is_html() {
        let content = FetchedContent {
            url: Url::parse("https://example.org/").unwrap(),
            status: 200,
            content_type: "text/html; charset=utf-8".to_string(),
            encoding: "utf-8".to_string(),
            bytes: b"<html></html>".to_vec(),
        };
        assert!(content.is_html());
        assert_eq!(content.text(), "<html></html>");

        let latin = FetchedContent {
            encoding: "iso-8859-1".to_string(),
            bytes: vec![b'c', 0xe9],
            ..content
        };
        assert_eq!(latin.text(), "cé");
    }

    fn create_test_content(encoding: &str, bytes: &[u8]) -> FetchedContent {
        FetchedContent {
            url: Url::parse("https://example.org/").unwrap(),
            status: 200,
            content_type: "text/html".to_string(),
            encoding: encoding.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_text_windows_1252() {
        // Curly quotes and the euro sign live in 0x80-0x9f, unlike Latin-1
        let content = create_test_content("windows-1252", &[0x93, b'h', b'i', 0x94, b' ', 0x80]);
        assert_eq!(content.text(), "\u{201c}hi\u{201d} \u{20ac}");
    }

    #[test]
    fn test_text_shift_jis() {
        let content = create_test_content("shift_jis", &[0x93, 0xfa, 0x96, 0x7b]);
        assert_eq!(content.text(), "日本");
    }

    #[test]
    fn test_text_unknown_label_reads_utf8() {
        let content = create_test_content("x-made-up", "café".as_bytes());
        assert_eq!(content.text(), "café");
    }
}
