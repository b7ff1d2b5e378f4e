use scanline_cache::Cache;
use scanline_fetch::{FetchConfig, Fetcher, RequestQueue, RetryPolicy, UserAgents};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::adapters::hentai20::{self, Hentai20};
use crate::adapters::mangareader::{self, MangaReader};
use crate::adapters::omegascans::{self, OmegaScans};
use crate::capability::{SourceId, SourceInfo};
use crate::error::{ErrorKind, Result, fetched};
use crate::service::{CachedSource, TtlPolicy};
use crate::source::Source;

/// Where each site lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    pub mangareader: Url,
    pub hentai20: Url,
    pub omegascans: Url,
    pub omegascans_api: Url,
}
impl Default for SiteUrls {
    fn default() -> Self {
        // The constants are known-good URLs.
        let parse = |url: &str| Url::parse(url).unwrap();
        Self {
            mangareader: parse(mangareader::BASE_URL),
            hentai20: parse(hentai20::BASE_URL),
            omegascans: parse(omegascans::BASE_URL),
            omegascans_api: parse(omegascans::API_BASE_URL),
        }
    }
}

/// Everything needed to build the adapters.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub urls: SiteUrls,
    pub timeout: Duration,
    pub user_agents: UserAgents,
    pub retry: RetryPolicy,
    pub ttl: TtlPolicy,
}
impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            urls: SiteUrls::default(),
            timeout: scanline_fetch::DEFAULT_TIMEOUT,
            user_agents: UserAgents::default(),
            retry: RetryPolicy::default(),
            ttl: TtlPolicy::default(),
        }
    }
}
impl RegistryConfig {
    fn fetch_config(&self, base_url: &Url) -> FetchConfig {
        FetchConfig {
            base_url: base_url.clone(),
            timeout: self.timeout,
            user_agents: self.user_agents.clone(),
            retry: self.retry,
        }
    }
}

/// Every source, sharing one request queue and one cache.
#[derive(Debug, Clone)]
pub struct Registry {
    sources: BTreeMap<SourceId, CachedSource>,
    cache: Arc<Cache>,
    ttl: TtlPolicy,
}

impl Registry {
    /// An empty registry; see [`Registry::register`].
    pub fn new(cache: Arc<Cache>, ttl: TtlPolicy) -> Self {
        Self { sources: BTreeMap::new(), cache, ttl }
    }

    /// Builds all three adapters, each with its own fetcher on the shared queue.
    pub fn from_config(config: &RegistryConfig, queue: Arc<RequestQueue>, cache: Arc<Cache>) -> Result<Self> {
        let fetcher = |url: &Url| fetched(Fetcher::new(config.fetch_config(url), Arc::clone(&queue)));
        let mut registry = Self::new(cache, config.ttl);
        registry.register(Arc::new(MangaReader::new(fetcher(&config.urls.mangareader)?)));
        registry.register(Arc::new(Hentai20::new(fetcher(&config.urls.hentai20)?)));
        registry.register(Arc::new(OmegaScans::new(fetcher(&config.urls.omegascans)?, config.urls.omegascans_api.as_str())));
        tracing::debug!(sources = registry.sources.len(), "Source registry ready");
        Ok(registry)
    }

    /// Adds (or replaces) a source.
    pub fn register(&mut self, source: Arc<dyn Source>) {
        let service = CachedSource::new(source, Arc::clone(&self.cache), self.ttl);
        self.sources.insert(service.id(), service);
    }

    pub fn get(&self, id: SourceId) -> Option<&CachedSource> {
        self.sources.get(&id)
    }

    /// Like [`Registry::get`], failing with [`ErrorKind::ValidationFailure`].
    pub fn require(&self, id: SourceId) -> Result<&CachedSource> {
        match self.sources.get(&id) {
            Some(source) => Ok(source),
            None => exn::bail!(ErrorKind::ValidationFailure(format!("source not registered: {id}"))),
        }
    }

    pub fn descriptors(&self) -> Vec<SourceInfo> {
        self.sources.values().map(CachedSource::descriptor).collect()
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ranking;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEARCH_PAGE: &str = r#"
        <div class="manga_list-sbs"><div class="mls-wrap">
            <div class="item item-spc">
                <a class="manga-poster" href="/one-piece-3"><img class="manga-poster-img" src="/one-piece.jpg" alt="One Piece"></a>
                <div class="manga-detail"><h3 class="manga-name"><a href="/one-piece-3" title="One Piece">One Piece</a></h3></div>
            </div>
            <div class="item item-spc">
                <a class="manga-poster" href="/one-piece-party-8"><img class="manga-poster-img" src="/party.jpg" alt="One Piece Party"></a>
                <div class="manga-detail"><h3 class="manga-name"><a href="/one-piece-party-8" title="One Piece Party">One Piece Party</a></h3></div>
            </div>
        </div></div>
    "#;

    async fn registry(server: &MockServer) -> Registry {
        let base: Url = server.uri().parse().unwrap();
        let config = RegistryConfig {
            urls: SiteUrls {
                mangareader: base.clone(),
                hentai20: base.clone(),
                omegascans: base.clone(),
                omegascans_api: base,
            },
            retry: RetryPolicy::once(),
            ..RegistryConfig::default()
        };
        let queue = Arc::new(RequestQueue::new(Duration::from_millis(1)));
        Registry::from_config(&config, queue, Arc::new(Cache::default())).unwrap()
    }

    #[tokio::test]
    async fn cold_then_warm_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("keyword", "one piece"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
            .expect(1)
            .mount(&server)
            .await;
        let registry = registry(&server).await;
        let source = registry.require(SourceId::MangaReader).unwrap();

        let cold = source.search("one piece", 1).await.unwrap();
        assert!(!cold.hit);
        assert_eq!(cold.value.len(), 2);
        assert!(cold.value.iter().all(|result| !result.id.is_empty() && !result.title.is_empty()));
        assert_eq!(cold.value[0].id, "one-piece-3");

        let warm = source.search("one piece", 1).await.unwrap();
        assert!(warm.hit);
        assert_eq!(warm.value, cold.value);
        let key = scanline_cache::CacheKey::new("mangareader", "search").param("query", "one piece").param("page", 1);
        assert_eq!(key.to_string(), "mangareader:search:page:1|query:one piece");
        assert!(registry.cache().get::<Vec<scanline_extract::models::SearchResult>>(&key).await.is_some());
    }

    #[tokio::test]
    async fn untitled_series_is_a_scrape_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/unknown-series"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><p>Nothing here</p></body></html>"))
            .mount(&server)
            .await;
        let registry = registry(&server).await;
        let err = registry.require(SourceId::MangaReader).unwrap().info("unknown-series").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ScrapeFailure { operation: "info" }));
    }

    #[tokio::test]
    async fn missing_pages_map_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;
        let registry = registry(&server).await;
        let err = registry.require(SourceId::Hentai20).unwrap().info("gone").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn chapters_without_pages_are_scrape_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/empty-chapter-1/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><h1 class=\"entry-title\">Empty Chapter 1</h1><div id=\"readerarea\"></div></body></html>"))
            .mount(&server)
            .await;
        let registry = registry(&server).await;
        let err = registry.require(SourceId::Hentai20).unwrap().chapter("empty-chapter-1").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ScrapeFailure { operation: "chapter" }));
    }

    fn hentai20_card(slug: &str, title: &str) -> String {
        format!(
            r#"<div class="bs"><div class="bsx"><a href="/manga/{slug}/" title="{title}">
                <img src="/wp-content/uploads/{slug}.jpg"><div class="tt">{title}</div>
            </a></div></div>"#
        )
    }

    #[tokio::test]
    async fn hentai20_type_and_rating_listings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/genres/manhwa-hentai-26/page/2/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(hentai20_card("sweet-home", "Sweet Home")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/manga/page/1/"))
            .and(query_param("order", "rating"))
            .respond_with(ResponseTemplate::new(200).set_body_string(hentai20_card("top-one", "Top One")))
            .expect(1)
            .mount(&server)
            .await;
        let registry = registry(&server).await;
        let source = registry.require(SourceId::Hentai20).unwrap();

        let manhwa = source.ranked(&Ranking::Type("Manhwa".into()), 2).await.unwrap();
        assert_eq!(manhwa.value[0].id, "sweet-home");
        let rated = source.ranked(&Ranking::TopRated, 1).await.unwrap();
        assert_eq!(rated.value[0].title, "Top One");

        let err = source.ranked(&Ranking::Type("webcomic".into()), 1).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ValidationFailure(_)));
        let err = source.ranked(&Ranking::Trending, 1).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unsupported { site: "hentai20", operation: "trending" }));
    }

    #[tokio::test]
    async fn omegascans_listing_by_series_type() {
        let server = MockServer::start().await;
        let body = serde_json::json!({"data": [
            {"series_slug": "night-reader", "title": "Night Reader", "series_type": "Novel"},
            {"series_slug": "stray-comic", "title": "Stray Comic", "series_type": "Comic"}
        ]});
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("type", "Novel"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
        let registry = registry(&server).await;
        let source = registry.require(SourceId::OmegaScans).unwrap();

        let novels = source.ranked(&Ranking::Type("novel".into()), 1).await.unwrap();
        let ids: Vec<_> = novels.value.iter().map(|result| result.id.as_str()).collect();
        assert_eq!(ids, vec!["night-reader"]);
        assert!(source.ranked(&Ranking::Type("novel".into()), 1).await.unwrap().hit);
        assert!(source.capabilities().supports(crate::Capability::Type));
    }

    #[tokio::test]
    async fn mangareader_titles_by_author() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("keyword", "Eiichiro Oda"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
            .expect(1)
            .mount(&server)
            .await;
        let registry = registry(&server).await;
        let source = registry.require(SourceId::MangaReader).unwrap();

        let titles = source.ranked(&Ranking::Author("Eiichiro Oda".into()), 1).await.unwrap();
        assert_eq!(titles.value.len(), 2);
        let key = scanline_cache::CacheKey::new("mangareader", "author").param("author", "eiichiro oda").param("page", 1);
        assert_eq!(key.to_string(), "mangareader:author:author:eiichiro oda|page:1");
        assert!(registry.cache().get::<Vec<scanline_extract::models::SearchResult>>(&key).await.is_some());
    }

    #[tokio::test]
    async fn describes_every_source() {
        let server = MockServer::start().await;
        let registry = registry(&server).await;
        let ids: Vec<_> = registry.descriptors().into_iter().map(|info| info.id).collect();
        assert_eq!(ids, SourceId::ALL.to_vec());
        let omegascans = registry.get(SourceId::OmegaScans).unwrap();
        assert!(!omegascans.capabilities().supports(crate::Capability::Genres));
    }
}
