use async_trait::async_trait;
use scanline_extract::models::{ChapterContent, ContentInfo, GenreRef, HomeFeed, SearchResult, Suggestion};
use scanline_extract::sites::mangareader as site;
use scanline_fetch::Fetcher;
use tracing::instrument;

use super::{bare_id, base_of, encode};
use crate::capability::{Capabilities, Capability, SourceId, SourceInfo};
use crate::error::{Result, extracted, fetched};
use crate::source::{Ranking, Source, unsupported};

pub const BASE_URL: &str = "https://mangareader.to";

const CAPABILITIES: Capabilities = Capabilities::new(&[
    Capability::Search,
    Capability::SearchSuggestions,
    Capability::PopularToday,
    Capability::PopularWeek,
    Capability::PopularMonth,
    Capability::LatestUpdates,
    Capability::Popular,
    Capability::NewRelease,
    Capability::Recommendations,
    Capability::Trending,
    Capability::Completed,
    Capability::Type,
    Capability::Author,
    Capability::Genres,
    Capability::Genre,
    Capability::Home,
    Capability::Info,
    Capability::Chapter,
]);

// Home sections assembled from listings, with their sizes.
const HOME_TRENDING: usize = 12;
const HOME_POPULAR_TODAY: usize = 10;
const HOME_RECOMMENDATIONS: usize = 12;
const HOME_NEW_RELEASES: usize = 12;

#[derive(Debug, Clone)]
pub struct MangaReader {
    fetcher: Fetcher,
    base: String,
}

impl MangaReader {
    pub fn new(fetcher: Fetcher) -> Self {
        let base = base_of(&fetcher);
        Self { fetcher, base }
    }

    async fn document(&self, path: &str) -> Result<String> {
        fetched(self.fetcher.fetch_document(path).await)
    }

    async fn listing(&self, path: &str) -> Result<Vec<SearchResult>> {
        let html = self.document(path).await?;
        Ok(site::listing(&html, &self.base))
    }

    /// A home section. The section is left empty when its listing fails.
    async fn section(&self, name: &'static str, path: &str, limit: usize) -> Vec<SearchResult> {
        match self.listing(path).await {
            Ok(mut items) => {
                items.truncate(limit);
                items
            },
            Err(err) => {
                let kind: &crate::error::ErrorKind = &err;
                tracing::warn!(section = name, error = %kind, "Omitting home section");
                Vec::new()
            },
        }
    }

    /// Image URLs from the AJAX reader endpoint; empty when it fails, so the
    /// images inlined in the reader page are used instead.
    async fn image_list(&self, id: &str, reading_id: &str) -> Vec<String> {
        let referer = format!("{}/{id}", self.base);
        let headers = [("X-Requested-With", "XMLHttpRequest"), ("Referer", referer.as_str())];
        let body = match self.fetcher.fetch_document_with(&site::image_list_path(reading_id), &headers).await {
            Ok(body) => body,
            Err(err) => {
                let kind: &scanline_fetch::error::ErrorKind = &err;
                tracing::warn!(reading_id, error = %kind, "Image list request failed, using reader page images");
                return Vec::new();
            },
        };
        site::image_list(&body, &self.base).unwrap_or_else(|err| {
            let kind: &scanline_extract::error::ErrorKind = &err;
            tracing::warn!(reading_id, error = %kind, "Image list unreadable, using reader page images");
            Vec::new()
        })
    }
}

#[async_trait]
impl Source for MangaReader {
    fn id(&self) -> SourceId {
        SourceId::MangaReader
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn descriptor(&self) -> SourceInfo {
        SourceInfo {
            id: self.id(),
            name: self.id().name(),
            base_url: self.base.clone(),
            is_active: true,
            capabilities: CAPABILITIES,
        }
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, page: u32) -> Result<Vec<SearchResult>> {
        self.listing(&format!("/search?keyword={}&page={page}", encode(query))).await
    }

    async fn popular(&self, page: u32) -> Result<Vec<SearchResult>> {
        self.listing(&format!("/filter?sort=most_viewed&page={page}")).await
    }

    async fn latest_updates(&self, page: u32) -> Result<Vec<SearchResult>> {
        self.listing(&format!("/filter?sort=latest-updated&page={page}")).await
    }

    #[instrument(skip(self))]
    async fn info(&self, id: &str) -> Result<ContentInfo> {
        let id = bare_id(id);
        let html = self.document(&format!("/{id}")).await?;
        extracted(site::info(&html, &self.base, id), Capability::Info.as_str())
    }

    /// Chapter ids are reader paths such as `read/one-piece-3/en/chapter-1100`.
    #[instrument(skip(self))]
    async fn chapter(&self, id: &str) -> Result<ChapterContent> {
        let id = bare_id(id);
        let html = self.document(&format!("/{id}")).await?;
        let reader = site::reader(&html, &self.base);
        let structured = match reader.reading_id.as_deref() {
            Some(reading_id) => self.image_list(id, reading_id).await,
            None => Vec::new(),
        };
        extracted(reader.into_chapter(id, structured), Capability::Chapter.as_str())
    }

    async fn search_suggestions(&self, query: &str) -> Result<Vec<Suggestion>> {
        let html = self.document(&format!("/search?keyword={}", encode(query))).await?;
        Ok(site::suggestions(&html, &self.base))
    }

    async fn popular_today(&self, page: u32) -> Result<Vec<SearchResult>> {
        self.listing(&format!("/filter?sort=most_viewed&time=day&page={page}")).await
    }

    async fn recommendations(&self, page: u32) -> Result<Vec<SearchResult>> {
        self.listing(&format!("/filter?sort=score&page={page}")).await
    }

    async fn ranked(&self, ranking: &Ranking, page: u32) -> Result<Vec<SearchResult>> {
        let path = match ranking {
            Ranking::PopularWeek => format!("/filter?sort=most_viewed&time=week&page={page}"),
            Ranking::PopularMonth => format!("/filter?sort=most_viewed&time=month&page={page}"),
            Ranking::NewRelease => format!("/filter?sort=recently_added&page={page}"),
            Ranking::Trending => format!("/filter?sort=trending&page={page}"),
            Ranking::Completed => format!("/completed?page={page}"),
            Ranking::Type(kind) => format!("/filter?type={}&page={page}", encode(kind)),
            Ranking::Author(author) => format!("/search?keyword={}&page={page}", encode(author)),
            Ranking::TopRated => return unsupported(self.id(), ranking.capability()),
        };
        self.listing(&path).await
    }

    async fn genres(&self) -> Result<Vec<GenreRef>> {
        Ok(site::genres())
    }

    async fn genre(&self, genre: &str, page: u32) -> Result<Vec<SearchResult>> {
        self.listing(&format!("/filter?genre={}&page={page}", encode(genre))).await
    }

    /// Only the latest updates are rendered server-side; the other sections
    /// come from their listings.
    #[instrument(skip(self))]
    async fn home(&self) -> Result<HomeFeed> {
        let html = self.document("/home").await?;
        let latest_updates = site::home_latest(&html, &self.base);
        let (trending, popular_today, recommendations, new_releases) = futures::join!(
            self.section("trending", "/filter?sort=trending&page=1", HOME_TRENDING),
            self.section("popular_today", "/filter?sort=most_viewed&time=day&page=1", HOME_POPULAR_TODAY),
            self.section("recommendations", "/filter?sort=score&page=1", HOME_RECOMMENDATIONS),
            self.section("new_releases", "/filter?sort=recently_added&page=1", HOME_NEW_RELEASES),
        );
        Ok(HomeFeed { trending, popular_today, latest_updates, new_releases, recommendations })
    }
}
