//! Response type shared by network fetches and cache hits.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::Headers;

/// A network or cached response.
///
/// The body is reference counted, so cloning a response to store one copy
/// and hand another to the caller does not copy the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase
    #[serde(default)]
    pub status_text: String,
    /// Response headers
    #[serde(default)]
    pub headers: Headers,
    /// Response body
    #[serde(with = "super::hex_body")]
    pub body: Bytes,
    /// Final URL after redirects, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
}

impl Response {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Headers::new(),
            body: body.into(),
            url: None,
        }
    }

    /// Creates a `200 OK` response.
    pub fn ok_with(body: impl Into<Bytes>) -> Self {
        Self::new(200, body).with_status_text("OK")
    }

    /// Sets the reason phrase.
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Sets a header, replacing existing values.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Sets the final URL.
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Returns true for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Value of the `content-type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_range() {
        assert!(Response::new(200, "").ok());
        assert!(Response::new(204, "").ok());
        assert!(!Response::new(304, "").ok());
        assert!(!Response::new(404, "").ok());
        assert!(!Response::new(199, "").ok());
    }

    #[test]
    fn test_clone_shares_body() {
        let resp = Response::ok_with(vec![7u8; 1024]);
        let copy = resp.clone();
        assert_eq!(resp.body.as_ptr(), copy.body.as_ptr());
    }

    #[test]
    fn test_json_body_is_hex() {
        let resp = Response::ok_with("hi").with_header("Content-Type", "text/plain");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["body"], "6869");

        let back: Response = serde_json::from_value(json).unwrap();
        assert_eq!(back.text(), "hi");
        assert_eq!(back.content_type(), Some("text/plain"));
    }
}
