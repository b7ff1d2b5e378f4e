//! The contract every site adapter implements.

use async_trait::async_trait;
use scanline_extract::models::{ChapterContent, ContentInfo, GenreRef, HomeFeed, SearchResult, Suggestion};
use serde::Serialize;
use std::fmt::Debug;

use crate::capability::{Capabilities, Capability, SourceId, SourceInfo};
use crate::error::{ErrorKind, Result};

/// Entries per upstream listing page.
pub const PAGE_SIZE: usize = 20;

/// Pagination metadata for a listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub has_next_page: bool,
}
impl PageInfo {
    /// Sites don't report a page count, so a full page implies another one.
    pub fn infer(page: u32, len: usize) -> Self {
        Self { current_page: page, has_next_page: len >= PAGE_SIZE }
    }
}

/// Additional listings some sites rank their catalogue by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ranking {
    PopularWeek,
    PopularMonth,
    NewRelease,
    Trending,
    Completed,
    TopRated,
    /// Filtered by content type, e.g. `manga` or `manhwa`.
    Type(String),
    /// Other titles by an author.
    Author(String),
}
impl Ranking {
    pub fn capability(&self) -> Capability {
        match self {
            Self::PopularWeek => Capability::PopularWeek,
            Self::PopularMonth => Capability::PopularMonth,
            Self::NewRelease => Capability::NewRelease,
            Self::Trending => Capability::Trending,
            Self::Completed => Capability::Completed,
            Self::TopRated => Capability::TopRated,
            Self::Type(_) => Capability::Type,
            Self::Author(_) => Capability::Author,
        }
    }
}

/// Fails with [`ErrorKind::Unsupported`].
pub(crate) fn unsupported<T>(source: SourceId, capability: Capability) -> Result<T> {
    exn::bail!(ErrorKind::Unsupported { site: source.as_str(), operation: capability.as_str() })
}

/// A site adapter.
///
/// Adapters fetch through their own [`Fetcher`](scanline_fetch::Fetcher) and
/// hand the documents to the matching extraction module. They never cache;
/// see [`CachedSource`](crate::CachedSource). Optional operations default to
/// [`ErrorKind::Unsupported`] and are listed in [`Source::capabilities`] when
/// implemented. Pages are 1-based.
#[async_trait]
pub trait Source: Debug + Send + Sync {
    fn id(&self) -> SourceId;

    fn capabilities(&self) -> Capabilities;

    /// Descriptor of this source.
    fn descriptor(&self) -> SourceInfo;

    async fn search(&self, query: &str, page: u32) -> Result<Vec<SearchResult>>;

    async fn popular(&self, page: u32) -> Result<Vec<SearchResult>>;

    async fn latest_updates(&self, page: u32) -> Result<Vec<SearchResult>>;

    /// Series details by id.
    async fn info(&self, id: &str) -> Result<ContentInfo>;

    async fn chapter(&self, id: &str) -> Result<ChapterContent>;

    async fn search_suggestions(&self, _query: &str) -> Result<Vec<Suggestion>> {
        unsupported(self.id(), Capability::SearchSuggestions)
    }

    async fn popular_today(&self, _page: u32) -> Result<Vec<SearchResult>> {
        unsupported(self.id(), Capability::PopularToday)
    }

    async fn recommendations(&self, _page: u32) -> Result<Vec<SearchResult>> {
        unsupported(self.id(), Capability::Recommendations)
    }

    async fn ranked(&self, ranking: &Ranking, _page: u32) -> Result<Vec<SearchResult>> {
        unsupported(self.id(), ranking.capability())
    }

    async fn genres(&self) -> Result<Vec<GenreRef>> {
        unsupported(self.id(), Capability::Genres)
    }

    async fn genre(&self, _genre: &str, _page: u32) -> Result<Vec<SearchResult>> {
        unsupported(self.id(), Capability::Genre)
    }

    async fn home(&self) -> Result<HomeFeed> {
        unsupported(self.id(), Capability::Home)
    }
}
