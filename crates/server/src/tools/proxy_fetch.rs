//! proxy_fetch tool implementation.
//!
//! Dispatches a request through the worker host, the same path a controlled
//! page's requests take.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_client::{resolve, validate_request};
use shelter_core::{Error, Request};
use shelter_worker::EventHost;
use url::Url;

/// Input parameters for proxy_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyFetchParams {
    /// Origin-relative path (`/offline.html`) or absolute URL.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers.
    #[serde(default)]
    pub headers: Vec<HeaderPair>,
}

fn default_method() -> String {
    "GET".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

/// Output structure for proxy_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyFetchOutput {
    /// URL the response was served from.
    pub url: String,
    pub status: u16,
    pub status_text: String,
    /// "basic", "cors", "opaque" or "error".
    pub response_type: String,
    pub headers: Vec<HeaderPair>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
}

/// Implementation of the proxy_fetch tool.
pub async fn proxy_fetch_impl(
    host: &EventHost, origin: &Url, params: ProxyFetchParams,
) -> Result<CallToolResult, McpError> {
    let url = resolve(origin, &params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;

    let mut request = Request::new(&params.method, url);
    for header in &params.headers {
        request = request.with_header(&header.name, header.value.clone());
    }
    validate_request(&request)?;

    let label = request.to_string();
    let response = host.dispatch_fetch(request).await.ok_or(Error::NoResponse(label))?;

    let output = ProxyFetchOutput {
        url: response.url.to_string(),
        status: response.status,
        status_text: response.status_text.clone(),
        response_type: response.response_type.as_str().to_string(),
        headers: response
            .headers
            .iter()
            .map(|(name, value)| HeaderPair { name: name.clone(), value: value.clone() })
            .collect(),
        body: response.text().into_owned(),
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
