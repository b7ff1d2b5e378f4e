//! One adapter per site.

pub mod hentai20;
pub mod mangareader;
pub mod omegascans;

use scanline_fetch::Fetcher;

/// Percent-encodes a query value the way the sites' own forms do.
pub(crate) fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.trim().as_bytes()).collect()
}

/// Base URL without its trailing slash, used to resolve extracted links.
pub(crate) fn base_of(fetcher: &Fetcher) -> String {
    fetcher.base_url().as_str().trim_end_matches('/').to_string()
}

/// Ids are accepted with or without a leading slash.
pub(crate) fn bare_id(id: &str) -> &str {
    id.trim().trim_start_matches('/')
}
