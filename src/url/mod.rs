//! URL handling module for orgcrawl
//!
//! This module provides URL canonicalization (the identity function for the
//! whole crawl), site membership checks, and the exclusion/priority rules
//! applied to discovered links before they reach the frontier.

mod canonical;
mod domain;
mod rules;

// Re-export main functions
pub use canonical::{canonicalize, CanonicalUrl};
pub use domain::{extract_domain, is_same_site};
pub use rules::{UrlRules, DEFAULT_PRIORITY, DOCUMENT_PRIORITY, SEED_PRIORITY};
