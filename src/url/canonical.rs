use crate::Rejected;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::{form_urlencoded, ParseError, Url};

/// A URL in canonical form
///
/// Two URLs that differ only in scheme/host case, default port, fragment,
/// query parameter order or trailing slashes share one `CanonicalUrl`.
/// Values are only produced by [`canonicalize`]; deserialization re-checks
/// that the stored string is already canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    /// Returns the canonical string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the canonical string back into a [`Url`]
    pub fn to_url(&self) -> Result<Url, Rejected> {
        Url::parse(&self.0).map_err(|_| Rejected::Malformed)
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CanonicalUrl {
    type Error = Rejected;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let canonical = canonicalize(&value, None)?;
        if canonical.0 == value {
            Ok(canonical)
        } else {
            Err(Rejected::Malformed)
        }
    }
}

impl From<CanonicalUrl> for String {
    fn from(value: CanonicalUrl) -> Self {
        value.0
    }
}

/// Canonicalizes a raw URL, resolving it against `base` when it is relative
///
/// # Canonicalization Steps
///
/// 1. Resolve against `base`; a relative URL without a base is `NotResolvable`
/// 2. Reject any scheme other than http/https
/// 3. Lowercase scheme and host, drop default ports (done by the parser)
/// 4. Remove the fragment
/// 5. Remove trailing slashes from the path, keeping a bare `/`
/// 6. Sort query parameters by key (stable) and re-encode them, except
///    pairs that do not decode to UTF-8, which keep their raw encoding
///
/// The function is pure and idempotent: canonicalizing a canonical URL
/// returns it unchanged.
///
/// # Examples
///
/// ```
/// use orgcrawl::url::canonicalize;
///
/// let a = canonicalize("http://Example.com:80/a?b=1&a=2", None).unwrap();
/// let b = canonicalize("http://example.com/a?a=2&b=1", None).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "http://example.com/a?a=2&b=1");
/// ```
pub fn canonicalize(raw: &str, base: Option<&CanonicalUrl>) -> Result<CanonicalUrl, Rejected> {
    let raw = raw.trim();

    let mut url = match base {
        Some(base) => base.to_url()?.join(raw).map_err(|_| Rejected::Malformed)?,
        None => Url::parse(raw).map_err(|e| match e {
            ParseError::RelativeUrlWithoutBase => Rejected::NotResolvable,
            _ => Rejected::Malformed,
        })?,
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Rejected::UnsupportedScheme);
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(Rejected::Malformed);
    }

    url.set_fragment(None);

    let path = strip_trailing_slashes(url.path()).to_string();
    url.set_path(&path);

    sort_query(&mut url);

    Ok(CanonicalUrl(url.into()))
}

/// Strips every trailing slash; an emptied path becomes the root
fn strip_trailing_slashes(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Sorts query pairs by key, keeping the relative order of repeated keys
fn sort_query(url: &mut Url) {
    let Some(query) = url.query() else {
        return;
    };

    let mut pairs: Vec<(String, String)> = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(normalize_query_pair)
        .collect();
    if pairs.is_empty() {
        url.set_query(None);
        return;
    }

    // sort_by is stable, so a=2&a=1 keeps its order
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let query: Vec<String> = pairs.into_iter().map(|(_, encoded)| encoded).collect();
    url.set_query(Some(&query.join("&")));
}

/// Sort key and encoded form of one `key=value` query segment
///
/// Segments that decode to UTF-8 are re-encoded, so `a=x+y` and `a=x%20y`
/// match. Any other segment keeps its raw encoding: decoding `%FF` and `%FE`
/// would turn both into U+FFFD and merge two different URLs.
fn normalize_query_pair(segment: &str) -> (String, String) {
    let (key, value) = form_urlencoded::parse(segment.as_bytes())
        .next()
        .unwrap_or_default();

    if key.contains(char::REPLACEMENT_CHARACTER) || value.contains(char::REPLACEMENT_CHARACTER) {
        return (key.into_owned(), segment.to_string());
    }

    let encoded = form_urlencoded::Serializer::new(String::new())
        .append_pair(&key, &value)
        .finish();
    (key.into_owned(), encoded)
}
