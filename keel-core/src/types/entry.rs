//! Cache entries and lookup rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::{Method, Request, Response};

/// Options controlling how a probe request is matched against stored ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Ignore the query string of both URLs.
    #[serde(default)]
    pub ignore_search: bool,
    /// Match regardless of method.
    #[serde(default)]
    pub ignore_method: bool,
}

impl MatchOptions {
    /// Exact URL matching.
    pub fn exact() -> Self {
        Self::default()
    }

    /// Matching that ignores the query string.
    pub fn ignore_search() -> Self {
        Self {
            ignore_search: true,
            ..Self::default()
        }
    }

    /// Returns true if `stored` answers `probe` under these options.
    pub fn matches(&self, stored: &Request, probe: &Request) -> bool {
        if !self.ignore_method && probe.method != Method::Get {
            return false;
        }
        match_key(&stored.url, self.ignore_search) == match_key(&probe.url, self.ignore_search)
    }
}

/// Normalised URL used to compare requests.
///
/// The fragment never takes part in matching; the query does unless
/// `ignore_search` is set.
pub fn match_key(url: &Url, ignore_search: bool) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    if ignore_search {
        url.set_query(None);
    }
    url.into()
}

/// A stored request/response pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The request the response was stored under
    pub request: Request,
    /// The stored response
    pub response: Response,
    /// When the entry was written
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(request: Request, response: Response) -> Self {
        Self {
            request,
            response,
            cached_at: Utc::now(),
        }
    }

    /// Returns true if this entry is stored under exactly `request`.
    pub fn is_for(&self, request: &Request) -> bool {
        self.request.method == request.method
            && match_key(&self.request.url, false) == match_key(&request.url, false)
    }
}
