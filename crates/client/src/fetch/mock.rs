//! Scripted in-memory network for tests and offline demos.
//!
//! Routes are keyed by absolute URL. Unrouted requests get a same-origin 404,
//! the way a live server would answer an unknown path.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use shelter_core::{Error, Request, Response};
use url::Url;

use super::Network;

#[derive(Default)]
struct Routes {
    responses: HashMap<String, Response>,
    failing: HashSet<String>,
    calls: Vec<Request>,
}

/// In-memory [`Network`] with an online/offline switch.
pub struct MockNetwork {
    origin: Url,
    online: AtomicBool,
    routes: Mutex<Routes>,
}

impl MockNetwork {
    pub fn new(origin: Url) -> Self {
        Self { origin, online: AtomicBool::new(true), routes: Mutex::new(Routes::default()) }
    }

    fn routes(&self) -> std::sync::MutexGuard<'_, Routes> {
        self.routes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn url(&self, path: &str) -> Url {
        self.origin.join(path).unwrap_or_else(|_| self.origin.clone())
    }

    /// Serve `response` for `path` (relative to the origin, or absolute).
    pub fn route(&self, path: &str, response: Response) -> &Self {
        let url = self.url(path);
        self.routes().responses.insert(url.to_string(), response);
        self
    }

    /// Serve a same-origin 200 with the given body.
    pub fn page(&self, path: &str, body: &str) -> &Self {
        let url = self.url(path);
        self.route(path, Response::new(url, 200).with_status_text("OK").with_body(body))
    }

    /// Make requests for `path` fail as if the host were unreachable.
    pub fn fail(&self, path: &str) -> &Self {
        let url = self.url(path);
        self.routes().failing.insert(url.to_string());
        self
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Every request seen so far, in arrival order.
    pub fn calls(&self) -> Vec<Request> {
        self.routes().calls.clone()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let mut routes = self.routes();
        routes.calls.push(request.clone());

        let key = request.url.to_string();
        if !self.online.load(Ordering::SeqCst) || routes.failing.contains(&key) {
            return Err(Error::Network(format!("{request}: connection refused")));
        }

        Ok(routes
            .responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Response::new(request.url.clone(), 404).with_status_text("Not Found")))
    }
}
