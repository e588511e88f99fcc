//! Live network access for intercepted requests.
//!
//! ### Outcome model
//! - Any HTTP status (including 4xx/5xx) is a successful fetch.
//! - Only transport failures (offline, DNS, refused, reset, timeout) are errors.
//!
//! ### Response types
//! - Final URL on the worker origin: `basic`
//! - Anything else: `cors`

pub mod mock;
pub mod url;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, is_same_origin, resolve};

use ::url::Url;
use shelter_core::{AppConfig, Error, Request, Response, ResponseType};

/// Where the worker's live fetches go.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request. `Err` means the network could not be reached.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Check that a request's method and headers can go on the wire.
///
/// # Errors
///
/// Returns `Error::InvalidInput` naming the first offending method or header.
pub fn validate_request(request: &Request) -> Result<(), Error> {
    parse_method(&request.method)?;
    for (name, value) in &request.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid header name {name:?}: {e}")))?;
        HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidInput(format!("invalid value for header {name}: {e}")))?;
    }
    Ok(())
}

fn parse_method(method: &str) -> Result<Method, Error> {
    Method::from_bytes(method.as_bytes()).map_err(|e| Error::InvalidInput(format!("invalid method {method}: {e}")))
}

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Origin used to classify responses as same-origin.
    pub origin: Url,

    /// User agent string (default: "shelter/0.1")
    pub user_agent: String,

    /// Request timeout (default: none)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 20)
    pub max_redirects: usize,
}

impl FetchConfig {
    pub fn new(origin: Url) -> Self {
        Self { origin, user_agent: "shelter/0.1".to_string(), timeout: None, max_redirects: 20 }
    }

    /// Build from application config.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the configured origin does not parse.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        Ok(Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), ..Self::new(origin) })
    }
}

/// reqwest-backed [`Network`].
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn classify(&self, final_url: &Url) -> ResponseType {
        if is_same_origin(&self.config.origin, final_url) { ResponseType::Basic } else { ResponseType::Cors }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        validate_request(request)?;
        let method = parse_method(&request.method)?;

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("{request}: {e}")))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response body: {e}")))?;

        let fetch_ms = start.elapsed().as_millis() as u64;
        let response_type = self.classify(&final_url);

        tracing::debug!(
            request = %request,
            status = status.as_u16(),
            response_type = %response_type,
            bytes = body.len(),
            fetch_ms,
            "network fetch complete"
        );

        Ok(Response {
            url: final_url,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: body.to_vec(),
            response_type,
        })
    }
}
