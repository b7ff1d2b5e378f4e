//! JSON envelopes printed to stdout.

use exn::ResultExt;
use scanline_sources::{Cached, PageInfo, SourceId};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{ErrorKind, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub source: SourceId,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageInfo>,
    pub cached: bool,
    pub timestamp: String,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(source: SourceId, cached: Cached<T>) -> Self {
        Self {
            success: true,
            source,
            data: cached.value,
            pagination: None,
            cached: cached.hit,
            timestamp: now(),
        }
    }

    pub fn render(&self) -> Result<String> {
        serde_json::to_string_pretty(self).or_raise(|| ErrorKind::Output)
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    /// A listing page, with pagination inferred from its length.
    pub fn page(source: SourceId, page: u32, cached: Cached<Vec<T>>) -> Self {
        let pagination = PageInfo::infer(page, cached.value.len());
        Self { pagination: Some(pagination), ..Self::new(source, cached) }
    }
}

fn now() -> String {
    // Rfc3339 only fails for years outside 0..=9999.
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}
