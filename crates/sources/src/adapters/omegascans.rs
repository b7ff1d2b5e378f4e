use async_trait::async_trait;
use scanline_extract::models::{ChapterContent, ContentInfo, HomeFeed, SearchResult};
use scanline_extract::sites::omegascans::{self as site, QueryPage};
use scanline_fetch::Fetcher;
use tracing::instrument;

use super::{bare_id, base_of};
use crate::capability::{Capabilities, Capability, SourceId, SourceInfo};
use crate::error::{ErrorKind, Result, extracted, fetched};
use crate::source::{Ranking, Source, unsupported};

pub const BASE_URL: &str = "https://omegascans.org";
pub use scanline_extract::sites::omegascans::API_BASE_URL;

const CAPABILITIES: Capabilities = Capabilities::new(&[
    Capability::Search,
    Capability::Popular,
    Capability::LatestUpdates,
    Capability::Type,
    Capability::Home,
    Capability::Info,
    Capability::Chapter,
]);

/// Listings come from the JSON API; chapters are read from the site itself.
#[derive(Debug, Clone)]
pub struct OmegaScans {
    fetcher: Fetcher,
    base: String,
    api: String,
}

impl OmegaScans {
    pub fn new(fetcher: Fetcher, api_base: &str) -> Self {
        let base = base_of(&fetcher);
        Self { fetcher, base, api: api_base.trim_end_matches('/').to_string() }
    }

    async fn query(&self, search: Option<&str>, sort: Option<&str>, page: u32) -> Result<QueryPage> {
        let url = format!("{}{}", self.api, site::query_path(search, sort, page));
        fetched(self.fetcher.fetch_json(&url).await)
    }

    /// Latest updates of one series type, `comic` or `novel`.
    async fn of_type(&self, kind: &str, page: u32) -> Result<Vec<SearchResult>> {
        let series_type = match kind.trim().to_ascii_lowercase().as_str() {
            "comic" => "Comic",
            "novel" => "Novel",
            other => exn::bail!(ErrorKind::ValidationFailure(format!("omegascans has no {other} listing"))),
        };
        let url = format!("{}{}", self.api, site::type_path(series_type, page));
        let page: QueryPage = fetched(self.fetcher.fetch_json(&url).await)?;
        Ok(site::of_type(&page, &self.base, series_type))
    }
}

#[async_trait]
impl Source for OmegaScans {
    fn id(&self) -> SourceId {
        SourceId::OmegaScans
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
        let page = self.query(Some(query.trim()), None, page).await?;
        Ok(site::search(&page, &self.base))
    }

    async fn popular(&self, page: u32) -> Result<Vec<SearchResult>> {
        let page = self.query(None, Some("total_views"), page).await?;
        Ok(site::listing(&page, &self.base))
    }

    async fn latest_updates(&self, page: u32) -> Result<Vec<SearchResult>> {
        let page = self.query(None, None, page).await?;
        Ok(site::listing(&page, &self.base))
    }

    /// The API has no lookup by slug, so the series is searched for.
    #[instrument(skip(self))]
    async fn info(&self, id: &str) -> Result<ContentInfo> {
        let id = bare_id(id);
        let page = self.query(Some(id), None, 1).await?;
        extracted(site::info(&page, &self.base, id), Capability::Info.as_str())
    }

    /// Chapter ids are site paths such as `series/solo-leveling/chapter-1`.
    #[instrument(skip(self))]
    async fn chapter(&self, id: &str) -> Result<ChapterContent> {
        let id = bare_id(id);
        let html = fetched(self.fetcher.fetch_document(&format!("/{id}")).await)?;
        extracted(site::chapter(&html, &self.base, id), Capability::Chapter.as_str())
    }

    async fn ranked(&self, ranking: &Ranking, page: u32) -> Result<Vec<SearchResult>> {
        match ranking {
            Ranking::Type(kind) => self.of_type(kind, page).await,
            other => unsupported(self.id(), other.capability()),
        }
    }

    async fn home(&self) -> Result<HomeFeed> {
        let page = self.query(None, None, 1).await?;
        Ok(site::home(&page, &self.base))
    }
}
