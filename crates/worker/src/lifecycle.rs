//! Install and activate handlers.

use futures_util::future::try_join_all;
use shelter_core::{Error, Request, Response};

use crate::context::{ActivateEvent, InstallEvent};
use crate::worker::OfflineWorker;

impl OfflineWorker {
    /// Precache the seed list into the current store.
    ///
    /// Any seed that fails to fetch, or answers with a non-2xx status, fails
    /// the whole install and nothing is written.
    pub async fn install(&self, event: InstallEvent) -> Result<(), Error> {
        event.controls.skip_waiting();

        let store = self.cache.open_store(&self.config.cache_name).await?;
        tracing::info!(
            store = %self.config.cache_name,
            seeds = self.config.precache.len(),
            "initial cache created"
        );

        let requests = self
            .config
            .precache
            .iter()
            .map(|target| self.request_for(target))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::InstallFailed(e.to_string()))?;

        let entries = try_join_all(requests.into_iter().map(|request| self.fetch_seed(request))).await?;
        store.put_all(entries).await?;

        tracing::info!(store = %self.config.cache_name, "precache complete");
        Ok(())
    }

    async fn fetch_seed(&self, request: Request) -> Result<(Request, Response), Error> {
        let response = self
            .network
            .fetch(&request)
            .await
            .map_err(|e| Error::InstallFailed(format!("{}: {e}", request.url)))?;

        if !response.is_ok() {
            let status = Error::HttpError(format!("{} returned {}", request.url, response.status));
            return Err(Error::InstallFailed(status.to_string()));
        }

        Ok((request, response))
    }

    /// Delete every store except the current one, then claim open clients.
    pub async fn activate(&self, event: ActivateEvent) -> Result<(), Error> {
        for name in self.cache.store_names().await? {
            if name == self.config.cache_name {
                continue;
            }
            tracing::info!(store = %name, "removing stale cache");
            if let Err(e) = self.cache.delete_store(&name).await {
                tracing::warn!(store = %name, error = %e, "failed to remove stale cache");
            }
        }

        let claimed = event.controls.claim_clients();
        tracing::info!(store = %self.config.cache_name, claimed, "worker active");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use shelter_client::MockNetwork;
    use shelter_core::CacheDb;
    use url::Url;

    use super::*;
    use crate::context::WorkerControls;
    use crate::worker::WorkerConfig;

    #[derive(Default)]
    struct Controls {
        skipped: AtomicBool,
        claims: AtomicUsize,
    }

    impl WorkerControls for Controls {
        fn skip_waiting(&self) {
            self.skipped.store(true, Ordering::SeqCst);
        }

        fn claim_clients(&self) -> usize {
            self.claims.fetch_add(1, Ordering::SeqCst);
            3
        }
    }

    fn origin() -> Url {
        Url::parse("http://127.0.0.1:5000").unwrap()
    }

    async fn worker(precache: &[&str]) -> (OfflineWorker, Arc<MockNetwork>) {
        let network = Arc::new(MockNetwork::new(origin()));
        let cache = CacheDb::open_in_memory().await.unwrap();
        let config = WorkerConfig {
            cache_name: "site-v2".into(),
            precache: precache.iter().map(|s| s.to_string()).collect(),
            offline_path: "/offline.html".into(),
        };
        (OfflineWorker::new(config, origin(), cache, network.clone()), network)
    }

    #[tokio::test]
    async fn test_install_caches_every_seed() {
        let (worker, network) = worker(&["/", "/offline.html", "/static/css/custom.css"]).await;
        network.page("/", "home").page("/offline.html", "offline").page("/static/css/custom.css", "body{}");
        let controls = Arc::new(Controls::default());

        worker.install(InstallEvent { controls: controls.clone() }).await.unwrap();

        let store = worker.cache.open_store("site-v2").await.unwrap();
        for path in ["/", "/offline.html", "/static/css/custom.css"] {
            let request = worker.request_for(path).unwrap();
            assert!(store.match_request(&request).await.unwrap().is_some(), "{path} not cached");
        }
        assert!(controls.skipped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_install_fails_on_unreachable_seed() {
        let (worker, network) = worker(&["/", "/static/img/logo.png"]).await;
        network.page("/", "home").fail("/static/img/logo.png");

        let result = worker.install(InstallEvent { controls: Arc::new(Controls::default()) }).await;

        assert!(matches!(result, Err(Error::InstallFailed(_))));
        let store = worker.cache.open_store("site-v2").await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_install_fails_on_error_status() {
        let (worker, network) = worker(&["/", "/static/manifest.json"]).await;
        network.page("/", "home");

        let result = worker.install(InstallEvent { controls: Arc::new(Controls::default()) }).await;

        assert!(matches!(result, Err(Error::InstallFailed(msg)) if msg.starts_with("HTTP_ERROR") && msg.contains("404")));
    }

    #[tokio::test]
    async fn test_activate_removes_stale_stores() {
        let (worker, _network) = worker(&[]).await;
        for name in ["site-v1", "site-v2", "other"] {
            worker.cache.open_store(name).await.unwrap();
        }
        let controls = Arc::new(Controls::default());

        worker.activate(ActivateEvent { controls: controls.clone() }).await.unwrap();

        assert_eq!(worker.cache.store_names().await.unwrap(), ["site-v2"]);
        assert_eq!(controls.claims.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_activate_without_current_store() {
        let (worker, _network) = worker(&[]).await;
        worker.cache.open_store("site-v1").await.unwrap();

        worker.activate(ActivateEvent { controls: Arc::new(Controls::default()) }).await.unwrap();

        assert!(worker.cache.store_names().await.unwrap().is_empty());
    }
}
