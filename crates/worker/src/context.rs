//! Registration surface between the worker and its host.
//!
//! Handlers return futures; the host awaits them before it considers the
//! event complete, so a failing install future means a failed install.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use shelter_core::{Error, Request, Response};

/// Completion of an install or activate handler.
pub type LifecycleFuture = BoxFuture<'static, Result<(), Error>>;

/// Completion of a fetch handler. `None` means no response could be produced.
pub type FetchFuture = BoxFuture<'static, Option<Response>>;

pub type LifecycleHandler<E> = Box<dyn Fn(E) -> LifecycleFuture + Send + Sync>;
pub type FetchHandler = Box<dyn Fn(FetchEvent) -> FetchFuture + Send + Sync>;

/// Host-side actions available to lifecycle handlers.
pub trait WorkerControls: Send + Sync {
    /// Activate as soon as install completes instead of waiting for old clients to close.
    fn skip_waiting(&self);

    /// Take control of every already-open client. Returns how many were claimed.
    fn claim_clients(&self) -> usize;
}

#[derive(Clone)]
pub struct InstallEvent {
    pub controls: Arc<dyn WorkerControls>,
}

#[derive(Clone)]
pub struct ActivateEvent {
    pub controls: Arc<dyn WorkerControls>,
}

#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub request: Request,
}

/// Registration points a host exposes to a worker.
pub trait WorkerContext {
    fn on_install(&mut self, handler: LifecycleHandler<InstallEvent>);
    fn on_activate(&mut self, handler: LifecycleHandler<ActivateEvent>);
    fn on_fetch(&mut self, handler: FetchHandler);
}
