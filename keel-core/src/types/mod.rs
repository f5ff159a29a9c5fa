//! Domain types for KEEL.
//!
//! This module provides the data structures a worker exchanges with its host:
//!
//! - [`Request`]: Method, URL, headers, mode and cache mode of an intercepted request
//! - [`Response`]: Status, headers and body of a network or cached answer
//! - [`Headers`]: Case-insensitive, order-preserving header list
//! - [`MatchOptions`] / [`CacheEntry`]: How stored requests are looked up
//! - [`WorkerMessage`]: Messages posted to a worker by its clients

mod headers;
mod request;
mod response;
mod entry;
mod message;

pub use headers::*;
pub use request::*;
pub use response::*;
pub use entry::*;
pub use message::*;

/// Serde helper storing byte bodies as hex strings.
pub(crate) mod hex_body {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
