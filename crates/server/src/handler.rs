//! MCP server handler implementation.
//!
//! Routes tool calls to the worker host and the cache storage.
use std::sync::Arc;

use crate::tools::cache::list::{CacheListParams, list_impl};
use crate::tools::proxy_fetch::{ProxyFetchParams, proxy_fetch_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shelter_core::CacheDb;
use shelter_worker::EventHost;
use url::Url;

/// The main MCP server handler for shelter.
#[derive(Clone)]
pub struct ShelterServer {
    host: Arc<EventHost>,
    cache: CacheDb,
    origin: Url,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ShelterServer {
    /// Create a new server handler around a started host.
    pub fn new(host: Arc<EventHost>, cache: CacheDb, origin: Url) -> Self {
        Self { host, cache, origin, tool_router: Self::tool_router() }
    }

    /// Fetch a URL through the offline worker.
    ///
    /// Live responses are returned while online; cached copies or the offline
    /// page are returned when the network is unreachable.
    #[tool(
        description = "Fetch a URL or origin-relative path through the offline-first worker. Returns status, response type, headers and body."
    )]
    async fn proxy_fetch(&self, params: Parameters<ProxyFetchParams>) -> Result<CallToolResult, McpError> {
        proxy_fetch_impl(&self.host, &self.origin, params.0).await
    }

    /// List cache stores and their stored request URLs.
    #[tool(description = "List every cache store (version tag) and the URLs stored in it.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(&self.cache, params.0).await
    }
}

impl ServerHandler for ShelterServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shelter".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
