use async_trait::async_trait;
use scanline_extract::models::{ChapterContent, ContentInfo, GenreRef, HomeFeed, SearchResult};
use scanline_extract::sites::hentai20 as site;
use scanline_fetch::Fetcher;
use tracing::instrument;

use super::{bare_id, base_of, encode};
use crate::capability::{Capabilities, Capability, SourceId, SourceInfo};
use crate::error::{ErrorKind, Result, extracted, fetched};
use crate::source::{Ranking, Source, unsupported};

pub const BASE_URL: &str = "https://hentai20.io";

const CAPABILITIES: Capabilities = Capabilities::new(&[
    Capability::Search,
    Capability::Popular,
    Capability::LatestUpdates,
    Capability::NewRelease,
    Capability::TopRated,
    Capability::Type,
    Capability::Genres,
    Capability::Genre,
    Capability::Home,
    Capability::Info,
    Capability::Chapter,
]);

/// Content types the site files under a genre of its own.
const TYPE_GENRES: &[(&str, &str)] = &[("manhwa", "manhwa-hentai-26"), ("manhua", "manga-hentai-902")];

#[derive(Debug, Clone)]
pub struct Hentai20 {
    fetcher: Fetcher,
    base: String,
}

impl Hentai20 {
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
}

#[async_trait]
impl Source for Hentai20 {
    fn id(&self) -> SourceId {
        SourceId::Hentai20
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
        self.listing(&format!("/?s={}&page={page}", encode(query))).await
    }

    async fn popular(&self, page: u32) -> Result<Vec<SearchResult>> {
        self.listing(&format!("/manga/page/{page}/?order=popular")).await
    }

    async fn latest_updates(&self, page: u32) -> Result<Vec<SearchResult>> {
        self.listing(&format!("/manga/page/{page}/?order=update")).await
    }

    #[instrument(skip(self))]
    async fn info(&self, id: &str) -> Result<ContentInfo> {
        let id = bare_id(id).trim_end_matches('/');
        let html = self.document(&format!("/manga/{id}/")).await?;
        extracted(site::info(&html, &self.base, id), Capability::Info.as_str())
    }

    #[instrument(skip(self))]
    async fn chapter(&self, id: &str) -> Result<ChapterContent> {
        let id = id.trim();
        let html = self.document(&site::chapter_path(id)).await?;
        extracted(site::chapter(&html, &self.base, id), Capability::Chapter.as_str())
    }

    async fn ranked(&self, ranking: &Ranking, page: u32) -> Result<Vec<SearchResult>> {
        let path = match ranking {
            Ranking::NewRelease => format!("/manga/page/{page}/?order=latest"),
            Ranking::TopRated => format!("/manga/page/{page}/?order=rating"),
            Ranking::Type(kind) => {
                let kind = kind.trim().to_ascii_lowercase();
                let Some((_, genre)) = TYPE_GENRES.iter().find(|(name, _)| *name == kind) else {
                    exn::bail!(ErrorKind::ValidationFailure(format!("hentai20 has no {kind} listing")));
                };
                format!("/genres/{genre}/page/{page}/")
            },
            other => return unsupported(self.id(), other.capability()),
        };
        self.listing(&path).await
    }

    async fn genres(&self) -> Result<Vec<GenreRef>> {
        let html = self.document("/genres/").await?;
        Ok(site::genres(&html))
    }

    async fn genre(&self, genre: &str, page: u32) -> Result<Vec<SearchResult>> {
        self.listing(&format!("/genres/{}/page/{page}/", encode(bare_id(genre)))).await
    }

    async fn home(&self) -> Result<HomeFeed> {
        let html = self.document("/").await?;
        Ok(site::home(&html, &self.base))
    }
}
