//! Record builders, one module per supported site.
//!
//! Builders take the fetched document (and the site's base URL for resolving
//! relative links) and return domain records. Listing builders silently drop
//! entries without an id or title; single-entity builders fail instead.

pub mod hentai20;
pub mod mangareader;
pub mod omegascans;

use scraper::ElementRef;

use crate::normalize::resolve_url;
use crate::rules::Candidates;

/// Resolves the first candidate URL, or returns an empty string.
pub(crate) fn resolved(candidates: &Candidates, scope: ElementRef<'_>, base: &str) -> String {
    candidates.first(scope).map(|url| resolve_url(base, &url)).unwrap_or_default()
}

/// Keeps builders to their first `limit` valid entries.
pub(crate) fn take_valid<T>(items: impl IntoIterator<Item = T>, is_valid: fn(&T) -> bool, limit: usize) -> Vec<T> {
    items.into_iter().filter(is_valid).take(limit).collect()
}
