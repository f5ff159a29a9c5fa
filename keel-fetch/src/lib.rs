//! HTTP fetcher for KEEL.
//!
//! Performs worker network requests against the upstream origin with reqwest.

mod http;

pub use http::{FetcherConfig, HttpFetcher};
