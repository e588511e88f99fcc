//! Request descriptors and response snapshots.
//!
//! A [`Response`] is a fully buffered snapshot: cloning it yields an
//! independent copy that can be written to the cache while the original is
//! handed back to the caller.

use std::borrow::Cow;
use std::fmt;

use url::Url;

use crate::cache::hash::compute_cache_key;

/// An outgoing request as seen by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Uppercase HTTP method.
    pub method: String,
    /// Absolute URL with the fragment removed.
    pub url: Url,
    /// Request headers in the order they were added, names lowercased.
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: impl AsRef<str>, mut url: Url) -> Self {
        url.set_fragment(None);
        Self { method: method.as_ref().to_ascii_uppercase(), url, headers: Vec::new() }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.push((name.as_ref().to_ascii_lowercase(), value.into()));
        self
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Cache key over method, URL and the listed vary headers.
    ///
    /// Vary headers are sorted by name so the key does not depend on the
    /// order they were configured in.
    pub fn cache_key(&self, vary_headers: &[String]) -> String {
        let mut names: Vec<String> = vary_headers.iter().map(|h| h.to_ascii_lowercase()).collect();
        names.sort();
        names.dedup();

        let vary = names
            .iter()
            .map(|name| format!("{name}:{}", self.header(name).unwrap_or("")))
            .collect::<Vec<_>>()
            .join("\n");

        compute_cache_key(&self.method, self.url.as_str(), &vary)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Origin classification of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseType {
    /// Same-origin response; safe to cache and replay.
    Basic,
    /// Cross-origin response with readable body.
    Cors,
    /// Cross-origin response that cannot be inspected.
    Opaque,
    /// Placeholder for a failed fetch.
    Error,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "basic" => Some(ResponseType::Basic),
            "cors" => Some(ResponseType::Cors),
            "opaque" => Some(ResponseType::Opaque),
            "error" => Some(ResponseType::Error),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final URL the response was served from.
    pub url: Url,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub response_type: ResponseType,
}

impl Response {
    /// A basic (same-origin) response with an empty body.
    pub fn new(url: Url, status: u16) -> Self {
        Self {
            url,
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
            response_type: ResponseType::Basic,
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.push((name.as_ref().to_ascii_lowercase(), value.into()));
        self
    }

    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// True for 2xx statuses.
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
