use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use super::cache::RevalidatingCache;
use super::types::{Article, ArticlePage, Source, TrendingResponse};
use crate::feed::FilterSelection;
use crate::util::validate_base_url;

/// Largest JSON body accepted from the backend (5MB).
const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024;

/// Page sizes accepted by `/api/v1/news`.
pub const PAGE_SIZE_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

const DETAIL_MAX_AGE: Duration = Duration::from_secs(3600);
const SOURCES_MAX_AGE: Duration = Duration::from_secs(3600);
const TRENDING_MAX_AGE: Duration = Duration::from_secs(60);

const DETAIL_CACHE_CAPACITY: usize = 256;

/// Errors surfaced by the news API client.
///
/// Everything except [`ApiError::NotFound`] is a network failure from the
/// caller's point of view; whether it is fatal depends on which load issued
/// the request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Single-resource lookup returned 404
    #[error("Article not found")]
    NotFound,
    /// Response body exceeded the size limit
    #[error("Response too large (limit {0} bytes)")]
    ResponseTooLarge(usize),
    /// Body was not the expected JSON shape
    #[error("Malformed response: {0}")]
    Decode(String),
    /// Configured base URL is unusable
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(e)
        }
    }
}

/// Creates a redirect policy with security limits.
///
/// - Maximum 3 redirects
/// - Detects redirect loops
/// - Logs each hop at debug level
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

// ============================================================================
// NewsClient
// ============================================================================

/// Client for the ThinkingNews REST API (`/api/v1`).
///
/// Cheap to clone: the HTTP pool and the response caches are shared, so a
/// clone can be moved into each spawned fetch task.
#[derive(Clone)]
pub struct NewsClient {
    http: reqwest::Client,
    base: Url,
    detail_cache: Arc<RevalidatingCache<String, Article>>,
    trending_cache: Arc<RevalidatingCache<u32, Vec<Article>>>,
    sources_cache: Arc<RevalidatingCache<(), Vec<Source>>>,
}

impl NewsClient {
    /// Builds a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidBaseUrl`] when `base_url` is not an http(s) URL
    /// with a host, [`ApiError::Network`] when the TLS backend fails to
    /// initialize.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(timeout)
            .user_agent(concat!("tnews/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http_client(http, base_url)
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn with_http_client(http: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let base =
            validate_base_url(base_url).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;

        let detail_cap = NonZeroUsize::new(DETAIL_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        let small_cap = NonZeroUsize::new(8).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            http,
            base,
            detail_cache: Arc::new(RevalidatingCache::new(detail_cap)),
            trending_cache: Arc::new(RevalidatingCache::new(small_cap)),
            sources_cache: Arc::new(RevalidatingCache::new(NonZeroUsize::MIN)),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Fetches one page of the article listing.
    ///
    /// `page` is 1-based. Only non-default filter fields reach the query
    /// string: an empty search, the "all sources" selection and the all-time
    /// window are omitted rather than sent as empty values.
    pub async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        filters: &FilterSelection,
    ) -> Result<ArticlePage, ApiError> {
        let mut url = self.endpoint(&["news"]);
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("page", &page.max(1).to_string())
                .append_pair(
                    "limit",
                    &page_size
                        .clamp(*PAGE_SIZE_RANGE.start(), *PAGE_SIZE_RANGE.end())
                        .to_string(),
                );
            for (key, value) in filters.query_pairs() {
                query.append_pair(key, value);
            }
        }

        tracing::debug!(url = %url, "Fetching article page");
        let result = self.get_json::<ArticlePage>(url).await;
        if let Err(ref e) = result {
            tracing::warn!(page, error = %e, "Article page fetch failed");
        }
        result
    }

    /// Fetches a single article by id.
    ///
    /// A 404 from the backend becomes [`ApiError::NotFound`].
    pub async fn fetch_article(&self, id: &str) -> Result<Article, ApiError> {
        let key = id.to_owned();
        if let Some(article) = self.detail_cache.get(&key, DETAIL_MAX_AGE) {
            return Ok(article);
        }

        let url = self.endpoint(&["news", id]);
        let article = match self.get_json::<Article>(url).await {
            Ok(article) => article,
            Err(ApiError::HttpStatus(404)) => return Err(ApiError::NotFound),
            Err(e) => return Err(e),
        };

        self.detail_cache.insert(key, article.clone());
        Ok(article)
    }

    /// Fetches the trending list (most recent `limit` articles ranked by the
    /// backend).
    pub async fn fetch_trending(&self, limit: u32) -> Result<Vec<Article>, ApiError> {
        let limit = limit.clamp(*PAGE_SIZE_RANGE.start(), *PAGE_SIZE_RANGE.end());
        if let Some(articles) = self.trending_cache.get(&limit, TRENDING_MAX_AGE) {
            return Ok(articles);
        }

        let mut url = self.endpoint(&["news", "trending"]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let response: TrendingResponse = self.get_json(url).await?;
        self.trending_cache.insert(limit, response.articles.clone());
        Ok(response.articles)
    }

    /// Fetches the list of news sources.
    pub async fn fetch_sources(&self) -> Result<Vec<Source>, ApiError> {
        if let Some(sources) = self.sources_cache.get(&(), SOURCES_MAX_AGE) {
            return Ok(sources);
        }

        let sources: Vec<Source> = self.get_json(self.endpoint(&["sources"])).await?;
        self.sources_cache.insert((), sources.clone());
        Ok(sources)
    }

    /// Forgets cached trending and source responses.
    ///
    /// Article details stay cached; articles are immutable once published.
    pub fn invalidate_lists(&self) {
        self.trending_cache.clear();
        self.sources_cache.clear();
    }

    /// `<base>/api/v1/<segments...>` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // The base is validated as http(s), which always has path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status.as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Reads a response body, failing as soon as it grows past `limit`.
async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::from_transport)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::TimeWindow;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn article_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": format!("Article {id}"),
            "summary": "Summary",
            "source": "TechCrunch",
            "source_url": null,
            "url": format!("https://techcrunch.com/{id}"),
            "published_at": "2024-05-01T10:00:00Z",
            "image_url": null,
            "created_at": "2024-05-01T10:05:00Z"
        })
    }

    fn page_json(ids: &[&str], page: u32, has_next: bool) -> serde_json::Value {
        json!({
            "articles": ids.iter().map(|id| article_json(id)).collect::<Vec<_>>(),
            "total": 42,
            "page": page,
            "limit": 20,
            "has_next": has_next
        })
    }

    fn client(server: &MockServer) -> NewsClient {
        NewsClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_page_default_filters_omits_optional_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/news"))
            .and(query_param("page", "1"))
            .and(query_param("limit", "20"))
            .and(query_param_is_missing("q"))
            .and(query_param_is_missing("source"))
            .and(query_param_is_missing("time"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["a", "b"], 1, true)))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server)
            .fetch_page(1, 20, &FilterSelection::default())
            .await
            .unwrap();

        assert_eq!(page.articles.len(), 2);
        assert_eq!(page.total, 42);
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn test_fetch_page_sends_active_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/news"))
            .and(query_param("page", "3"))
            .and(query_param("q", "gpt agents"))
            .and(query_param("source", "Hacker News"))
            .and(query_param("time", "week"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["z"], 3, false)))
            .expect(1)
            .mount(&server)
            .await;

        let filters = FilterSelection {
            search: "gpt agents".into(),
            source: "Hacker News".into(),
            time: TimeWindow::Week,
        };
        let page = client(&server).fetch_page(3, 20, &filters).await.unwrap();
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_fetch_page_clamps_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/news"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[], 1, false)))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .fetch_page(1, 500, &FilterSelection::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fetch_page_http_error_is_distinguishable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_page(1, 20, &FilterSelection::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus(503)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_page_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_page(1, 20, &FilterSelection::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_page_network_failure() {
        // Nothing listens on the discard port.
        let client = NewsClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client
            .fetch_page(1, 20, &FilterSelection::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, ApiError::Network(_) | ApiError::Timeout),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_response_size_limit() {
        let server = MockServer::start().await;
        let huge = "x".repeat(MAX_RESPONSE_SIZE + 1);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(huge))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_page(1, 20, &FilterSelection::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ResponseTooLarge(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_fetch_article_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/news/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Article not found"})))
            .mount(&server)
            .await;

        let err = client(&server).fetch_article("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_article_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/news/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(article_json("abc")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let first = client.fetch_article("abc").await.unwrap();
        let second = client.clone().fetch_article("abc").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fetch_article_encodes_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/news/a%2Fb"))
            .respond_with(ResponseTemplate::new(200).set_body_json(article_json("a/b")))
            .expect(1)
            .mount(&server)
            .await;

        let article = client(&server).fetch_article("a/b").await.unwrap();
        assert_eq!(article.id, "a/b");
    }

    #[tokio::test]
    async fn test_fetch_trending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/news/trending"))
            .and(query_param("limit", "5"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"articles": [article_json("t1"), article_json("t2")]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(client.fetch_trending(5).await.unwrap().len(), 2);
        // Served from cache within the revalidation window.
        assert_eq!(client.fetch_trending(5).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_lists_refetches_sources() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/sources"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"name": "Hacker News"}, {"name": "TechCrunch"}])),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server);
        let sources = client.fetch_sources().await.unwrap();
        assert_eq!(sources[1].name, "TechCrunch");

        client.fetch_sources().await.unwrap();
        client.invalidate_lists();
        client.fetch_sources().await.unwrap();
    }

    #[tokio::test]
    async fn test_base_url_with_path_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/backend/api/v1/sources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            NewsClient::new(&format!("{}/backend", server.uri()), Duration::from_secs(5)).unwrap();
        assert!(client.fetch_sources().await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = NewsClient::new("ftp://example.com", Duration::from_secs(5));
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }
}
