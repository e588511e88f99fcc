//! The offline worker and its registration with a host.

use std::sync::Arc;

use futures_util::FutureExt;
use shelter_client::{Network, resolve};
use shelter_core::{AppConfig, CacheDb, Error, Request};
use url::Url;

use crate::context::{ActivateEvent, FetchEvent, InstallEvent, WorkerContext};

/// What the worker caches and under which version tag.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Version tag; names the only store kept after activation.
    pub cache_name: String,
    /// Seed list, fetched and stored at install.
    pub precache: Vec<String>,
    /// Served when a request misses both network and cache.
    pub offline_path: String,
}

impl From<&AppConfig> for WorkerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            cache_name: config.cache_name.clone(),
            precache: config.precache.clone(),
            offline_path: config.offline_path.clone(),
        }
    }
}

pub struct OfflineWorker {
    pub(crate) config: WorkerConfig,
    pub(crate) origin: Url,
    pub(crate) cache: CacheDb,
    pub(crate) network: Arc<dyn Network>,
}

impl OfflineWorker {
    pub fn new(config: WorkerConfig, origin: Url, cache: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { config, origin, cache, network }
    }

    /// Register the install, activate and fetch handlers.
    pub fn register(self: &Arc<Self>, ctx: &mut dyn WorkerContext) {
        let worker = Arc::clone(self);
        ctx.on_install(Box::new(move |event: InstallEvent| {
            let worker = Arc::clone(&worker);
            async move { worker.install(event).await }.boxed()
        }));

        let worker = Arc::clone(self);
        ctx.on_activate(Box::new(move |event: ActivateEvent| {
            let worker = Arc::clone(&worker);
            async move { worker.activate(event).await }.boxed()
        }));

        let worker = Arc::clone(self);
        ctx.on_fetch(Box::new(move |event: FetchEvent| {
            let worker = Arc::clone(&worker);
            async move { worker.handle_fetch(event).await }.boxed()
        }));
    }

    /// GET request for a worker-relative path or absolute URL.
    pub(crate) fn request_for(&self, target: &str) -> Result<Request, Error> {
        let url = resolve(&self.origin, target).map_err(|e| Error::InvalidUrl(format!("{target}: {e}")))?;
        Ok(Request::get(url))
    }
}
