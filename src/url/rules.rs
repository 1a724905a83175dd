use crate::config::FilterConfig;

/// Priority given to seed URLs
pub const SEED_PRIORITY: u32 = 0;

/// Priority given to document links found on a page
pub const DOCUMENT_PRIORITY: u32 = 0;

/// Priority for links that match no priority pattern
pub const DEFAULT_PRIORITY: u32 = 3;

/// Exclusion and priority rules applied to discovered links
///
/// All patterns are case-insensitive substrings of the canonical URL.
/// Patterns are lowercased once at construction so matching only has to
/// lowercase the candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlRules {
    exclusions: Vec<String>,
    high: Vec<String>,
    medium: Vec<String>,
    low: Vec<String>,
}

impl UrlRules {
    /// Builds the rules from the `[filters]` configuration section
    pub fn from_config(filters: &FilterConfig) -> Self {
        Self {
            exclusions: lowercase_all(&filters.exclusions),
            high: lowercase_all(&filters.priority.high),
            medium: lowercase_all(&filters.priority.medium),
            low: lowercase_all(&filters.priority.low),
        }
    }

    /// Returns true if the URL contains any exclusion pattern
    pub fn is_excluded(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        contains_any(&url, &self.exclusions)
    }

    /// Determines the priority of a discovered page link
    ///
    /// # Returns
    ///
    /// * `0` - Matches a high priority pattern
    /// * `1` - Matches a medium priority pattern
    /// * `2` - Matches a low priority pattern
    /// * `3` - Matches nothing
    pub fn priority_for(&self, url: &str) -> u32 {
        let url = url.to_lowercase();

        if contains_any(&url, &self.high) {
            0
        } else if contains_any(&url, &self.medium) {
            1
        } else if contains_any(&url, &self.low) {
            2
        } else {
            DEFAULT_PRIORITY
        }
    }
}

fn lowercase_all(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

fn contains_any(url: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| url.contains(p.as_str()))
}
