//! Read-through caching around a [`Source`].

use scanline_cache::{Cache, CacheKey};
use scanline_extract::models::{ChapterContent, ContentInfo, GenreRef, HomeFeed, SearchResult, Suggestion};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::capability::{Capabilities, Capability, SourceId, SourceInfo};
use crate::error::{ErrorKind, Result};
use crate::source::{Ranking, Source, unsupported};

/// Ephemeral TTL per data category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub listings: Duration,
    pub suggestions: Duration,
    pub info: Duration,
    pub chapter: Duration,
    pub genres: Duration,
    pub home: Duration,
}
impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            listings: Duration::from_secs(600),
            suggestions: Duration::from_secs(600),
            info: Duration::from_secs(3600),
            chapter: Duration::from_secs(3600),
            genres: Duration::from_secs(86_400),
            home: Duration::from_secs(300),
        }
    }
}

/// A record together with whether it was served from the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cached<T> {
    pub value: T,
    pub hit: bool,
}

/// Values the service caches. Empty values are returned but not stored.
pub trait Record: Serialize + DeserializeOwned + Send {
    fn is_empty(&self) -> bool {
        false
    }
}
impl<T: Serialize + DeserializeOwned + Send> Record for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}
impl Record for ContentInfo {}
impl Record for ChapterContent {}
impl Record for HomeFeed {
    fn is_empty(&self) -> bool {
        HomeFeed::is_empty(self)
    }
}

/// One source behind the shared cache.
///
/// Validates requests, refuses operations the source does not offer, and
/// serves repeated requests from the cache under keys such as
/// `mangareader:search:page:1|query:one piece`. Concurrent misses for the
/// same key each fetch.
#[derive(Debug, Clone)]
pub struct CachedSource {
    source: Arc<dyn Source>,
    cache: Arc<Cache>,
    ttl: TtlPolicy,
}

fn validate_page(page: u32) -> Result<()> {
    if page == 0 {
        exn::bail!(ErrorKind::ValidationFailure("page must be at least 1".to_string()));
    }
    Ok(())
}

fn validate_text<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        exn::bail!(ErrorKind::ValidationFailure(format!("{name} must not be empty")));
    }
    Ok(value)
}

impl CachedSource {
    pub fn new(source: Arc<dyn Source>, cache: Arc<Cache>, ttl: TtlPolicy) -> Self {
        Self { source, cache, ttl }
    }

    pub fn id(&self) -> SourceId {
        self.source.id()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.source.capabilities()
    }

    pub fn descriptor(&self) -> SourceInfo {
        self.source.descriptor()
    }

    fn key(&self, capability: Capability) -> CacheKey {
        CacheKey::new(self.id().as_str(), capability.as_str())
    }

    fn ensure(&self, capability: Capability) -> Result<()> {
        if self.capabilities().supports(capability) {
            Ok(())
        } else {
            unsupported(self.id(), capability)
        }
    }

    async fn cached<T, F, Fut>(&self, key: CacheKey, ttl: Duration, load: F) -> Result<Cached<T>>
    where
        T: Record,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.cache.get::<T>(&key).await {
            return Ok(Cached { value, hit: true });
        }
        let value = load().await?;
        if value.is_empty() {
            tracing::debug!(key = %key, "Not caching empty result");
        } else {
            self.cache.set(&key, &value, ttl).await;
        }
        Ok(Cached { value, hit: false })
    }

    #[instrument(skip(self), fields(source = %self.id()))]
    pub async fn search(&self, query: &str, page: u32) -> Result<Cached<Vec<SearchResult>>> {
        let query = validate_text("query", query)?;
        validate_page(page)?;
        let key = self.key(Capability::Search).param("query", query).param("page", page);
        self.cached(key, self.ttl.listings, || self.source.search(query, page)).await
    }

    #[instrument(skip(self), fields(source = %self.id()))]
    pub async fn search_suggestions(&self, query: &str) -> Result<Cached<Vec<Suggestion>>> {
        let query = validate_text("query", query)?;
        self.ensure(Capability::SearchSuggestions)?;
        let key = self.key(Capability::SearchSuggestions).param("query", query);
        self.cached(key, self.ttl.suggestions, || self.source.search_suggestions(query)).await
    }

    pub async fn popular(&self, page: u32) -> Result<Cached<Vec<SearchResult>>> {
        validate_page(page)?;
        let key = self.key(Capability::Popular).param("page", page);
        self.cached(key, self.ttl.listings, || self.source.popular(page)).await
    }

    pub async fn popular_today(&self, page: u32) -> Result<Cached<Vec<SearchResult>>> {
        validate_page(page)?;
        self.ensure(Capability::PopularToday)?;
        let key = self.key(Capability::PopularToday).param("page", page);
        self.cached(key, self.ttl.listings, || self.source.popular_today(page)).await
    }

    pub async fn latest_updates(&self, page: u32) -> Result<Cached<Vec<SearchResult>>> {
        validate_page(page)?;
        let key = self.key(Capability::LatestUpdates).param("page", page);
        self.cached(key, self.ttl.listings, || self.source.latest_updates(page)).await
    }

    pub async fn recommendations(&self, page: u32) -> Result<Cached<Vec<SearchResult>>> {
        validate_page(page)?;
        self.ensure(Capability::Recommendations)?;
        let key = self.key(Capability::Recommendations).param("page", page);
        self.cached(key, self.ttl.listings, || self.source.recommendations(page)).await
    }

    pub async fn ranked(&self, ranking: &Ranking, page: u32) -> Result<Cached<Vec<SearchResult>>> {
        validate_page(page)?;
        self.ensure(ranking.capability())?;
        let mut key = self.key(ranking.capability()).param("page", page);
        match ranking {
            Ranking::Type(kind) => key = key.param("type", validate_text("type", kind)?.to_lowercase()),
            Ranking::Author(author) => key = key.param("author", validate_text("author", author)?.to_lowercase()),
            _ => {},
        }
        self.cached(key, self.ttl.listings, || self.source.ranked(ranking, page)).await
    }

    pub async fn genres(&self) -> Result<Cached<Vec<GenreRef>>> {
        self.ensure(Capability::Genres)?;
        self.cached(self.key(Capability::Genres), self.ttl.genres, || self.source.genres()).await
    }

    #[instrument(skip(self), fields(source = %self.id()))]
    pub async fn genre(&self, genre: &str, page: u32) -> Result<Cached<Vec<SearchResult>>> {
        let genre = validate_text("genre", genre)?;
        validate_page(page)?;
        self.ensure(Capability::Genre)?;
        let key = self.key(Capability::Genre).param("genre", genre).param("page", page);
        self.cached(key, self.ttl.listings, || self.source.genre(genre, page)).await
    }

    #[instrument(skip(self), fields(source = %self.id()))]
    pub async fn home(&self) -> Result<Cached<HomeFeed>> {
        self.ensure(Capability::Home)?;
        self.cached(self.key(Capability::Home), self.ttl.home, || self.source.home()).await
    }

    #[instrument(skip(self), fields(source = %self.id()))]
    pub async fn info(&self, id: &str) -> Result<Cached<ContentInfo>> {
        let id = validate_text("id", id)?;
        let key = self.key(Capability::Info).param("id", id);
        self.cached(key, self.ttl.info, || self.source.info(id)).await
    }

    #[instrument(skip(self), fields(source = %self.id()))]
    pub async fn chapter(&self, id: &str) -> Result<Cached<ChapterContent>> {
        let id = validate_text("id", id)?;
        let key = self.key(Capability::Chapter).param("id", id);
        self.cached(key, self.ttl.chapter, || self.source.chapter(id)).await
    }
}
