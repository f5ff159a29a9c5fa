//! Intercepted request types.
//!
//! A [`Request`] carries what a worker needs to pick a strategy and to key
//! the cache: method, absolute URL, headers, the request mode (navigation
//! or subresource) and the cache mode for the network fetch.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::HTML_MEDIA_TYPE;
use crate::error::{KeelError, Result};
use crate::types::Headers;

/// HTTP request method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// HEAD
    Head,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
}

impl Method {
    /// Canonical uppercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = KeelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            other => Err(KeelError::InvalidMethod(other.to_string())),
        }
    }
}

/// How the request was initiated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page navigation.
    Navigate,
    /// Same-origin subresource.
    SameOrigin,
    /// Opaque cross-origin subresource.
    NoCors,
    /// CORS subresource.
    #[default]
    Cors,
}

impl FromStr for RequestMode {
    type Err = KeelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "navigate" => Ok(RequestMode::Navigate),
            "same-origin" => Ok(RequestMode::SameOrigin),
            "no-cors" => Ok(RequestMode::NoCors),
            "cors" => Ok(RequestMode::Cors),
            other => Err(KeelError::ConfigError(format!("unknown request mode '{}'", other))),
        }
    }
}

/// How the network fetch should treat intermediate HTTP caches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    /// Normal HTTP caching.
    #[default]
    Default,
    /// Never read or write the HTTP cache.
    NoStore,
    /// Skip the HTTP cache for the read, refresh it with the result.
    Reload,
    /// Revalidate with the server before using a cached copy.
    NoCache,
    /// Use any cached copy regardless of freshness.
    ForceCache,
}

impl CacheMode {
    /// Returns true if the fetch must go to the origin.
    pub fn bypasses_http_cache(&self) -> bool {
        matches!(self, CacheMode::Reload | CacheMode::NoCache | CacheMode::NoStore)
    }
}

/// A request as seen by the worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Absolute request URL
    pub url: Url,
    /// Request headers
    #[serde(default)]
    pub headers: Headers,
    /// Request mode
    #[serde(default)]
    pub mode: RequestMode,
    /// Cache mode for the network fetch
    #[serde(default)]
    pub cache: CacheMode,
    /// Request body (empty for GET/HEAD)
    #[serde(default, skip_serializing_if = "Bytes::is_empty", with = "super::hex_body")]
    pub body: Bytes,
}

impl Request {
    /// Creates a request from a method and an absolute URL.
    pub fn new(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| KeelError::InvalidUrl {
            input: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_url(method, url))
    }

    /// Creates a request from an already parsed URL.
    pub fn from_url(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            mode: RequestMode::default(),
            cache: CacheMode::default(),
            body: Bytes::new(),
        }
    }

    /// Creates a GET request for an absolute URL.
    pub fn get(url: &str) -> Result<Self> {
        Self::new(Method::Get, url)
    }

    /// Creates a GET request for `path` resolved against `base`.
    ///
    /// Relative paths such as `./index.html` resolve the way a browser
    /// resolves them against the worker scope.
    pub fn resolve(base: &Url, path: &str) -> Result<Self> {
        let url = base.join(path).map_err(|e| KeelError::InvalidUrl {
            input: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_url(Method::Get, url))
    }

    /// Creates a navigation request (mode `navigate`, accepting HTML).
    pub fn navigate(url: &str) -> Result<Self> {
        Ok(Self::get(url)?
            .with_mode(RequestMode::Navigate)
            .with_header("accept", "text/html,application/xhtml+xml,*/*;q=0.8"))
    }

    /// Sets the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the cache mode.
    pub fn with_cache_mode(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    /// Sets a header, replacing existing values.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns true for top-level page navigations.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Returns true if the `Accept` header asks for an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.headers
            .get_all("accept")
            .any(|v| v.contains(HTML_MEDIA_TYPE))
    }

    /// Returns true if the request should be answered network-first.
    pub fn is_document_request(&self) -> bool {
        self.is_navigation() || self.accepts_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_resolve_relative_core_assets() {
        let scope = Url::parse("https://example.com/game/sw.js").unwrap();

        let root = Request::resolve(&scope, "./").unwrap();
        assert_eq!(root.url.as_str(), "https://example.com/game/");

        let index = Request::resolve(&scope, "./index.html").unwrap();
        assert_eq!(index.url.as_str(), "https://example.com/game/index.html");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = Request::get("not a url");
        assert!(matches!(result, Err(KeelError::InvalidUrl { .. })));
    }

    #[test_case("get", Method::Get)]
    #[test_case("POST", Method::Post)]
    #[test_case("Delete", Method::Delete)]
    fn test_method_parse(input: &str, expected: Method) {
        assert_eq!(input.parse::<Method>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_method() {
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test_case(RequestMode::Navigate, None, true ; "navigation")]
    #[test_case(RequestMode::Cors, Some("text/html"), true ; "html accept")]
    #[test_case(RequestMode::Cors, Some("text/html,application/xhtml+xml"), true ; "html list")]
    #[test_case(RequestMode::NoCors, Some("image/avif,image/webp"), false ; "image")]
    #[test_case(RequestMode::SameOrigin, None, false ; "no accept")]
    fn test_document_request(mode: RequestMode, accept: Option<&str>, expected: bool) {
        let mut req = Request::get("https://example.com/x").unwrap().with_mode(mode);
        if let Some(accept) = accept {
            req = req.with_header("Accept", accept);
        }
        assert_eq!(req.is_document_request(), expected);
    }

    #[test]
    fn test_reload_bypasses_http_cache() {
        assert!(CacheMode::Reload.bypasses_http_cache());
        assert!(!CacheMode::Default.bypasses_http_cache());
        assert!(!CacheMode::ForceCache.bypasses_http_cache());
    }
}
