//! In-process host that drives a worker through its lifecycle.
//!
//! The host owns the registered handlers, awaits each handler's future, and
//! tracks the lifecycle state:
//!
//! ```text
//! Parsed -> Installing -> Installed -> Activating -> Activated
//!               \______________\____________\______-> Redundant
//! ```
//!
//! Fetches are routed to the worker only once it is `Activated`; before that,
//! or after it became redundant, requests go straight to the network.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use shelter_client::Network;
use shelter_core::{Error, Request, Response};
use tokio::sync::RwLock;

use crate::context::{
    ActivateEvent, FetchEvent, FetchHandler, InstallEvent, LifecycleHandler, WorkerContext, WorkerControls,
};

/// Lifecycle state of the hosted worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
struct Controls {
    skip_waiting: AtomicBool,
    connected: AtomicUsize,
    controlled: AtomicUsize,
}

impl WorkerControls for Controls {
    fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    fn claim_clients(&self) -> usize {
        let connected = self.connected.load(Ordering::SeqCst);
        let previous = self.controlled.swap(connected, Ordering::SeqCst);
        connected.saturating_sub(previous)
    }
}

pub struct EventHost {
    network: Arc<dyn Network>,
    install: Vec<LifecycleHandler<InstallEvent>>,
    activate: Vec<LifecycleHandler<ActivateEvent>>,
    fetch: Vec<FetchHandler>,
    state: RwLock<WorkerState>,
    controls: Arc<Controls>,
}

impl EventHost {
    /// `network` serves requests the worker does not control.
    pub fn new(network: Arc<dyn Network>) -> Self {
        Self {
            network,
            install: Vec::new(),
            activate: Vec::new(),
            fetch: Vec::new(),
            state: RwLock::new(WorkerState::Parsed),
            controls: Arc::new(Controls::default()),
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Whether the worker asked to skip the waiting phase.
    pub fn skip_waiting_requested(&self) -> bool {
        self.controls.skip_waiting.load(Ordering::SeqCst)
    }

    /// Open a new client page. Returns the number of connected clients.
    pub fn connect_client(&self) -> usize {
        self.controls.connected.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Clients currently controlled by the worker.
    pub fn controlled_clients(&self) -> usize {
        self.controls.controlled.load(Ordering::SeqCst)
    }

    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(Error::InvalidState(format!("cannot move to {to} from {}", *state)));
        }
        *state = to;
        Ok(())
    }

    async fn set_state(&self, to: WorkerState) {
        *self.state.write().await = to;
    }

    /// Run every install handler. On failure the worker becomes redundant.
    pub async fn install(&self) -> Result<(), Error> {
        self.transition(WorkerState::Parsed, WorkerState::Installing).await?;

        let event = InstallEvent { controls: self.controls.clone() };
        for handler in &self.install {
            if let Err(e) = handler(event.clone()).await {
                tracing::error!(error = %e, "install failed");
                self.set_state(WorkerState::Redundant).await;
                return Err(e);
            }
        }

        self.set_state(WorkerState::Installed).await;
        tracing::info!(skip_waiting = self.skip_waiting_requested(), "worker installed");
        Ok(())
    }

    /// Run every activate handler. Requires a completed install.
    pub async fn activate(&self) -> Result<(), Error> {
        self.transition(WorkerState::Installed, WorkerState::Activating).await?;

        let event = ActivateEvent { controls: self.controls.clone() };
        for handler in &self.activate {
            if let Err(e) = handler(event.clone()).await {
                tracing::error!(error = %e, "activate failed");
                self.set_state(WorkerState::Redundant).await;
                return Err(e);
            }
        }

        self.set_state(WorkerState::Activated).await;
        Ok(())
    }

    /// Install, then activate.
    pub async fn start(&self) -> Result<(), Error> {
        self.install().await?;
        self.activate().await
    }

    /// Route a request through the worker, or straight to the network if the
    /// worker is not active.
    ///
    /// The first fetch handler that produces a response wins.
    pub async fn dispatch_fetch(&self, request: Request) -> Option<Response> {
        let state = self.state().await;
        if state != WorkerState::Activated || self.fetch.is_empty() {
            tracing::debug!(request = %request, state = %state, "worker not active, passing through");
            return match self.network.fetch(&request).await {
                Ok(response) => Some(response),
                Err(e) => {
                    tracing::debug!(request = %request, error = %e, "uncontrolled fetch failed");
                    None
                }
            };
        }

        for handler in &self.fetch {
            if let Some(response) = handler(FetchEvent { request: request.clone() }).await {
                return Some(response);
            }
        }
        None
    }
}

impl WorkerContext for EventHost {
    fn on_install(&mut self, handler: LifecycleHandler<InstallEvent>) {
        self.install.push(handler);
    }

    fn on_activate(&mut self, handler: LifecycleHandler<ActivateEvent>) {
        self.activate.push(handler);
    }

    fn on_fetch(&mut self, handler: FetchHandler) {
        self.fetch.push(handler);
    }
}
