//! Network-first request interception.

use shelter_core::{Request, Response, ResponseType};

use crate::context::FetchEvent;
use crate::worker::OfflineWorker;

/// Only complete same-origin 200s are stored.
fn is_cacheable(response: &Response) -> bool {
    response.status == 200 && response.response_type == ResponseType::Basic
}

impl OfflineWorker {
    /// Answer an intercepted request.
    ///
    /// Returns `None` only when the network fails and neither the request nor
    /// the offline page is cached.
    pub async fn handle_fetch(&self, event: FetchEvent) -> Option<Response> {
        let request = event.request;

        match self.network.fetch(&request).await {
            Ok(response) => {
                if is_cacheable(&response) {
                    self.store(&request, response.clone()).await;
                }
                Some(response)
            }
            Err(e) => {
                tracing::debug!(request = %request, error = %e, "network failed, falling back to cache");
                self.fallback(&request).await
            }
        }
    }

    async fn store(&self, request: &Request, response: Response) {
        let result = match self.cache.open_store(&self.config.cache_name).await {
            Ok(store) => store.put(request, &response).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(request = %request, error = %e, "failed to cache response");
        }
    }

    async fn fallback(&self, request: &Request) -> Option<Response> {
        if let Some(cached) = self.lookup(request).await {
            tracing::debug!(request = %request, "serving cached response");
            return Some(cached);
        }

        let offline = match self.request_for(&self.config.offline_path) {
            Ok(offline) => offline,
            Err(e) => {
                tracing::warn!(error = %e, "offline path does not resolve");
                return None;
            }
        };

        let page = self.lookup(&offline).await;
        if page.is_none() {
            tracing::warn!(request = %request, offline = %offline.url, "no cached response and no offline page");
        }
        page
    }

    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.cache.match_request(request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(request = %request, error = %e, "cache lookup failed");
                None
            }
        }
    }
}
