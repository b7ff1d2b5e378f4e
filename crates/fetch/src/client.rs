use std::sync::Arc;
use std::time::Duration;

use exn::{OptionExt, ResultExt};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

use crate::agents::UserAgents;
use crate::error::{ErrorKind, Result};
use crate::queue::RequestQueue;
use crate::retry::RetryPolicy;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Per-site fetch settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Relative request paths are joined onto this URL.
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agents: UserAgents,
    pub retry: RetryPolicy,
}
impl FetchConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            user_agents: UserAgents::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Fetches documents from one site through the shared [`RequestQueue`].
///
/// Cheap to clone. Every request picks a random user agent, is retried
/// according to the configured [`RetryPolicy`] and counts as a single task on
/// the queue for all of its attempts.
#[derive(Debug, Clone)]
pub struct Fetcher {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    client: reqwest::Client,
    base: Url,
    agents: UserAgents,
    retry: RetryPolicy,
    queue: Arc<RequestQueue>,
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers
}

impl Fetcher {
    pub fn new(config: FetchConfig, queue: Arc<RequestQueue>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(browser_headers())
            .build()
            .or_raise(|| ErrorKind::Client("failed to build HTTP client".to_string()))?;
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                base: config.base_url,
                agents: config.user_agents,
                retry: config.retry,
                queue,
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Resolves a request path. Absolute `http(s)` URLs are used as they are.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.inner.url(path)
    }

    /// Fetches `path` and returns the response body as text.
    pub async fn fetch_document(&self, path: &str) -> Result<String> {
        self.fetch_document_with(path, &[]).await
    }

    /// Like [`Fetcher::fetch_document`], sending additional request headers.
    pub async fn fetch_document_with(&self, path: &str, headers: &[(&str, &str)]) -> Result<String> {
        self.request(path, headers, |_, body| Ok(body)).await
    }

    /// Fetches `path` and decodes the body as JSON.
    pub async fn fetch_json<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.fetch_json_with(path, &[]).await
    }

    pub async fn fetch_json_with<T>(&self, path: &str, headers: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.request(path, headers, |path, body| {
            serde_json::from_str(&body).or_raise(|| ErrorKind::Decode(path.to_string()))
        })
        .await
    }

    async fn request<T, D>(&self, path: &str, headers: &[(&str, &str)], decode: D) -> Result<T>
    where
        T: Send + 'static,
        D: Fn(&str, String) -> Result<T> + Send + Sync + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let url = inner.url(path)?;
        let path = path.to_string();
        let headers: Vec<(String, String)> =
            headers.iter().map(|(name, value)| (name.to_string(), value.to_string())).collect();
        let queue = Arc::clone(&inner.queue);
        queue
            .add(move || async move {
                inner
                    .retry
                    .run(|| async {
                        let body = inner.attempt(&url, &path, &headers).await?;
                        decode(&path, body)
                    })
                    .await
            })
            .await
    }
}

impl Inner {
    fn url(&self, path: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(path)
            && matches!(url.scheme(), "http" | "https")
        {
            return Ok(url);
        }
        self.base.join(path).ok().ok_or_raise(|| ErrorKind::Client(format!("invalid request path: {path}")))
    }

    async fn attempt(&self, url: &Url, path: &str, headers: &[(String, String)]) -> Result<String> {
        let agent = self.agents.pick();
        tracing::debug!(url = %url, user_agent = agent, "Fetching document");
        let mut request = self.client.get(url.clone()).header(header::USER_AGENT, agent);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                let kind = ErrorKind::from_transport(path, &err);
                return Err(err).or_raise(|| kind);
            },
        };
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = status.as_u16(), "Upstream responded with failure status");
            exn::bail!(ErrorKind::from_status(path, status.as_u16()));
        }
        match response.text().await {
            Ok(body) => Ok(body),
            Err(err) => {
                let kind = ErrorKind::from_transport(path, &err);
                Err(err).or_raise(|| kind)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryMode;
    use serde::Deserialize;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn fetcher(server: &MockServer, retry: RetryPolicy) -> Fetcher {
        let mut config = FetchConfig::new(server.uri().parse().unwrap());
        config.retry = retry;
        config.timeout = Duration::from_millis(500);
        Fetcher::new(config, Arc::new(RequestQueue::new(Duration::from_millis(1)))).unwrap()
    }

    fn fast_retry(mode: RetryMode) -> RetryPolicy {
        RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(5), mode }
    }

    #[tokio::test]
    async fn fetches_document_with_rotating_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("keyword", "one piece"))
            .respond_with(|request: &Request| {
                let agent = request.headers.get("user-agent").and_then(|agent| agent.to_str().ok()).unwrap_or_default();
                ResponseTemplate::new(200).set_body_string(agent.to_string())
            })
            .expect(1)
            .mount(&server)
            .await;
        let body = fetcher(&server, RetryPolicy::once())
            .fetch_document("/search?keyword=one%20piece")
            .await
            .unwrap();
        assert!(UserAgents::default().contains(&body));
    }

    #[tokio::test]
    async fn not_found_is_not_retried_for_transient_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        let err = fetcher(&server, fast_retry(RetryMode::TransientOnly)).fetch_document("/missing").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(path) if path == "/missing"));
    }

    #[tokio::test]
    async fn server_errors_exhaust_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;
        let err = fetcher(&server, fast_retry(RetryMode::Always)).fetch_document("/broken").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn unavailable_maps_to_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;
        let err = fetcher(&server, fast_retry(RetryMode::TransientOnly)).fetch_document("/").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;
        let err = fetcher(&server, RetryPolicy::once()).fetch_document("/slow").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Timeout(_)));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        status: bool,
        html: String,
    }

    #[tokio::test]
    async fn decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ajax/images"))
            .and(header("x-requested-with", "XMLHttpRequest"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":true,"html":"<div></div>"}"#))
            .expect(1)
            .mount(&server)
            .await;
        let payload: Payload = fetcher(&server, RetryPolicy::once())
            .fetch_json_with("/ajax/images", &[("X-Requested-With", "XMLHttpRequest")])
            .await
            .unwrap();
        assert_eq!(payload, Payload { status: true, html: "<div></div>".to_string() });
    }

    #[tokio::test]
    async fn invalid_json_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;
        let err = fetcher(&server, RetryPolicy::once()).fetch_json::<Payload>("/api").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Decode(path) if path == "/api"));
    }

    #[tokio::test]
    async fn absolute_urls_bypass_base() {
        let site = MockServer::start().await;
        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string("api"))
            .expect(1)
            .mount(&api)
            .await;
        let fetcher = fetcher(&site, RetryPolicy::once());
        let body = fetcher.fetch_document(&format!("{}/query", api.uri())).await.unwrap();
        assert_eq!(body, "api");
    }

    #[tokio::test]
    async fn sends_extra_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/read/x"))
            .and(header("referer", "https://mangareader.to/x"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;
        let body = fetcher(&server, RetryPolicy::once())
            .fetch_document_with("/read/x", &[("Referer", "https://mangareader.to/x")])
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }
}
