//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow, classified as internal or external
//! - Links to downloadable documents
//! - Page title and description

use super::traits::{ContentExtractor, DocumentLink, ExtractedLink, LinkKind, PageMetadata};
use crate::url::is_same_site;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// [`ContentExtractor`] built on `scraper`
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    base_domain: String,
}

impl HtmlExtractor {
    /// Creates an extractor that classifies links against `base_domain`
    pub fn new(base_domain: impl Into<String>) -> Self {
        Self {
            base_domain: base_domain.into().to_lowercase(),
        }
    }

    fn classify(&self, url: &Url) -> LinkKind {
        match url.host_str() {
            Some(host) if is_same_site(host, &self.base_domain) => LinkKind::Internal,
            _ => LinkKind::External,
        }
    }
}

impl ContentExtractor for HtmlExtractor {
    /// Extracts followable links from `<a href>` tags
    ///
    /// # Link Extraction Rules
    ///
    /// **Exclude:**
    /// - `<a href="..." download>`
    /// - `javascript:`, `mailto:`, `tel:` links
    /// - Data URIs
    /// - Fragment-only links
    ///
    /// Each absolute URL is reported once, with the anchor text of its
    /// first occurrence.
    fn extract_links(&self, html: &str, base: &Url) -> Vec<ExtractedLink> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in anchors(&document) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(absolute) = element.value().attr("href").and_then(|h| resolve_link(h, base))
            else {
                continue;
            };

            if !seen.insert(absolute.to_string()) {
                continue;
            }

            links.push(ExtractedLink {
                kind: self.classify(&absolute),
                url: absolute.to_string(),
                anchor_text: anchor_text(&element),
            });
        }

        links
    }

    /// Extracts links whose path ends with one of the given extensions
    ///
    /// Anchors with a `download` attribute are included here.
    fn extract_document_links(
        &self,
        html: &str,
        base: &Url,
        extensions: &[String],
    ) -> Vec<DocumentLink> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut documents = Vec::new();

        for element in anchors(&document) {
            let Some(absolute) = element.value().attr("href").and_then(|h| resolve_link(h, base))
            else {
                continue;
            };

            let Some(doc_type) = document_type(&absolute, extensions) else {
                continue;
            };

            if seen.insert(absolute.to_string()) {
                documents.push(DocumentLink {
                    url: absolute.to_string(),
                    doc_type,
                });
            }
        }

        documents
    }

    fn extract_metadata(&self, html: &str) -> PageMetadata {
        let document = Html::parse_document(html);
        PageMetadata {
            title: extract_title(&document),
            description: extract_description(&document),
        }
    }
}

fn anchors(document: &Html) -> Vec<ElementRef<'_>> {
    match Selector::parse("a[href]") {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn anchor_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name='description'][content]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Returns the matching extension (without the dot) if the URL path ends with one
fn document_type(url: &Url, extensions: &[String]) -> Option<String> {
    let path = url.path().to_lowercase();
    extensions
        .iter()
        .map(|ext| ext.to_lowercase())
        .find(|ext| path.ends_with(ext.as_str()))
        .map(|ext| ext.trim_start_matches('.').to_string())
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.org/section/page").unwrap()
    }

    fn extractor() -> HtmlExtractor {
        HtmlExtractor::new("example.org")
    }

    fn urls(html: &str) -> Vec<String> {
        extractor()
            .extract_links(html, &base_url())
            .into_iter()
            .map(|l| l.url)
            .collect()
    }

    fn pdf_extensions() -> Vec<String> {
        vec![".pdf".to_string(), ".docx".to_string()]
    }

    #[test]
    fn test_extract_title_and_description() {
        let html = r#"<html><head><title>  Annual Report  </title>
            <meta name="description" content="Our year in review"></head><body></body></html>"#;
        let metadata = extractor().extract_metadata(html);
        assert_eq!(metadata.title, Some("Annual Report".to_string()));
        assert_eq!(metadata.description, Some("Our year in review".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        assert_eq!(extractor().extract_metadata(html), PageMetadata::default());
    }

    #[test]
    fn test_extract_relative_links() {
        let html = r#"<a href="/other">A</a><a href="sibling">B</a><a href="../up">C</a>"#;
        assert_eq!(
            urls(html),
            vec![
                "https://example.org/other",
                "https://example.org/section/sibling",
                "https://example.org/up",
            ]
        );
    }

    #[test]
    fn test_classification() {
        let html = r#"
            <a href="/about">About</a>
            <a href="https://news.example.org/item">News</a>
            <a href="https://partner.net/">Partner</a>
        "#;
        let links = extractor().extract_links(html, &base_url());
        let kinds: Vec<LinkKind> = links.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![LinkKind::Internal, LinkKind::Internal, LinkKind::External]
        );
    }

    #[test]
    fn test_anchor_text_normalized() {
        let html = "<a href=\"/team\">\n  Our <b>Team</b>\n</a>";
        let links = extractor().extract_links(html, &base_url());
        assert_eq!(links[0].anchor_text, "Our Team");
    }

    #[test]
    fn test_skip_special_links() {
        let html = r##"
            <a href="javascript:void(0)">js</a>
            <a href="MAILTO:test@example.org">mail</a>
            <a href="tel:+1234567890">tel</a>
            <a href="data:text/html,hi">data</a>
            <a href="#section">jump</a>
            <a href="">empty</a>
            <a href="/file.pdf" download>dl</a>
        "##;
        assert!(urls(html).is_empty());
    }

    #[test]
    fn test_duplicates_reported_once() {
        let html = r#"<a href="/a">one</a><a href="/a#x">two</a><a href="https://example.org/a">three</a>"#;
        let links = extractor().extract_links(html, &base_url());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].anchor_text, "one");
    }

    #[test]
    fn test_extract_document_links() {
        let html = r#"
            <a href="/files/Report.PDF">Report</a>
            <a href="/files/form.docx" download>Form</a>
            <a href="/files/image.png">Image</a>
            <a href="/about">About</a>
            <a href="https://cdn.other.net/brief.pdf">Brief</a>
        "#;
        let docs = extractor().extract_document_links(html, &base_url(), &pdf_extensions());
        assert_eq!(
            docs,
            vec![
                DocumentLink {
                    url: "https://example.org/files/Report.PDF".to_string(),
                    doc_type: "pdf".to_string(),
                },
                DocumentLink {
                    url: "https://example.org/files/form.docx".to_string(),
                    doc_type: "docx".to_string(),
                },
                DocumentLink {
                    url: "https://cdn.other.net/brief.pdf".to_string(),
                    doc_type: "pdf".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_document_query_string_ignored_for_type() {
        let html = r#"<a href="/get.pdf?id=4">Doc</a><a href="/view?file=a.pdf">View</a>"#;
        let docs = extractor().extract_document_links(html, &base_url(), &pdf_extensions());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].url, "https://example.org/get.pdf?id=4");
    }
}
