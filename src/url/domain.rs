use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain/host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use orgcrawl::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.ORG/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.org".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether `host` belongs to the site rooted at `base_domain`
///
/// A host is on the same site when it equals the base domain or is one of
/// its subdomains. Comparison is case-insensitive. A leading `www.` on the
/// base domain is not special: `www.example.org` does not cover
/// `example.org`.
///
/// # Examples
///
/// ```
/// use orgcrawl::url::is_same_site;
///
/// assert!(is_same_site("example.org", "example.org"));
/// assert!(is_same_site("news.example.org", "example.org"));
/// assert!(!is_same_site("badexample.org", "example.org"));
/// ```
pub fn is_same_site(host: &str, base_domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let base = base_domain.to_ascii_lowercase();

    if base.is_empty() {
        return false;
    }

    host == base || host.ends_with(&format!(".{}", base))
}
