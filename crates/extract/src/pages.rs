//! Chapter page selection.
//!
//! Readers expose their pages twice: once in a structured payload (inline
//! script JSON, an AJAX image list or embedded media URLs) and once as plain
//! `<img>` tags. The payload is authoritative; the images are a fallback and
//! carry site chrome that has to be filtered out.

use scraper::{ElementRef, Selector};
use tracing::instrument;

use crate::consts::NON_CONTENT_MARKERS;
use crate::models::Page;
use crate::normalize::resolve_url;
use crate::rules::Field;

const IMAGE_SOURCE: Field = Field::AnyAttr(&["data-url", "data-src", "data-lazy-src", "src"]);

/// Picks the structured payload when it produced any URL, otherwise the
/// reader images minus anything that looks like an icon or spinner.
#[instrument(level = "trace", skip_all, fields(primary = primary.len(), fallback = fallback.len()))]
pub fn select(primary: Vec<String>, fallback: Vec<String>) -> Vec<Page> {
    let primary: Vec<String> = primary.into_iter().filter(|url| !url.trim().is_empty()).collect();
    if !primary.is_empty() {
        return Page::sequence(primary);
    }
    Page::sequence(fallback.into_iter().filter(|url| is_content(url)))
}

/// Returns `false` for empty URLs and URLs containing a non-content marker.
pub fn is_content(url: &str) -> bool {
    !url.trim().is_empty() && !NON_CONTENT_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Walks the images matched by `images` within `scope`, resolving each
/// against `base`. Filtering happens in [`select`].
pub fn reader_images(scope: ElementRef<'_>, images: &Selector, base: &str) -> Vec<String> {
    scope
        .select(images)
        .filter_map(|image| IMAGE_SOURCE.read(image))
        .map(|url| resolve_url(base, &url))
        .collect()
}
