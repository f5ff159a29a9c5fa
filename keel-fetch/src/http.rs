//! reqwest-backed [`Fetcher`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use keel_core::constants::{DEFAULT_FETCH_TIMEOUT_SECS, USER_AGENT};
use keel_core::error::{KeelError, Result};
use keel_core::traits::Fetcher;
use keel_core::types::{Headers, Method, Request, Response};

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "content-length",
    "host",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// HTTP fetcher configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent sent with every request
    pub user_agent: String,
    /// Maximum number of redirects to follow
    pub max_redirects: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: USER_AGENT.to_string(),
            max_redirects: 10,
        }
    }
}

impl FetcherConfig {
    /// Sets the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Network fetcher for worker requests.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    config: FetcherConfig,
    http_client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    /// Creates a fetcher with the given config.
    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| KeelError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn map_error(&self, request: &Request, err: reqwest::Error) -> KeelError {
        if err.is_timeout() {
            KeelError::Timeout {
                url: request.url.to_string(),
                millis: self.config.timeout_seconds * 1000,
            }
        } else {
            KeelError::network(&request.url, err)
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let mut builder = self
            .http_client
            .request(to_reqwest_method(request.method), request.url.clone());

        for (name, value) in request.headers.iter() {
            if HOP_BY_HOP.contains(&name) {
                continue;
            }
            builder = builder.header(name, value);
        }

        if request.cache.bypasses_http_cache() {
            builder = builder
                .header("cache-control", "no-cache")
                .header("pragma", "no-cache");
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_error(request, e))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers: Headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_error(request, e))?;

        debug!(status = status.as_u16(), bytes = body.len(), "Fetched");

        let mut out = Response::new(status.as_u16(), body).with_url(final_url);
        out.status_text = status.canonical_reason().unwrap_or_default().to_string();
        out.headers = headers;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::types::CacheMode;
    use tokio_test::assert_ok;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html>", "text/html"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let req = Request::get(&format!("{}/index.html", server.uri())).unwrap();
        let resp = assert_ok!(fetcher.fetch(&req).await);

        assert!(resp.ok());
        assert_eq!(resp.text(), "<html>");
        assert_eq!(resp.content_type(), Some("text/html"));
        assert_eq!(resp.status_text, "OK");
    }

    #[tokio::test]
    async fn test_reload_sends_no_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("cache-control", "no-cache"))
            .and(header("pragma", "no-cache"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let req = Request::get(&format!("{}/", server.uri()))
            .unwrap()
            .with_cache_mode(CacheMode::Reload);
        let resp = fetcher.fetch(&req).await.unwrap();
        assert_eq!(resp.text(), "fresh");
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let req = Request::get(&format!("{}/missing.png", server.uri())).unwrap();
        let resp = fetcher.fetch(&req).await.unwrap();
        assert_eq!(resp.status, 404);
        assert!(!resp.ok());
    }

    #[tokio::test]
    async fn test_post_forwards_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/score"))
            .and(body_string("{\"score\":3}"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let req = Request::new(Method::Post, &format!("{}/api/score", server.uri()))
            .unwrap()
            .with_body("{\"score\":3}");
        let resp = fetcher.fetch(&req).await.unwrap();
        assert_eq!(resp.status, 201);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let fetcher = HttpFetcher::with_config(FetcherConfig::default().with_timeout(2)).unwrap();
        let req = Request::get("http://127.0.0.1:1/").unwrap();
        let err = fetcher.fetch(&req).await.unwrap_err();
        assert!(err.is_network_error());
    }
}
