//! Offline-first request worker.
//!
//! The worker registers three handlers against a [`WorkerContext`]:
//!
//! - **install** precaches the seed list into the store named by the version tag
//! - **activate** deletes every other store and claims open clients
//! - **fetch** goes network-first, caching same-origin 200s, and falls back to
//!   the cached request and then the offline page
//!
//! [`EventHost`] is an in-process host that drives those events.

pub mod context;
pub mod host;
mod intercept;
mod lifecycle;
pub mod worker;

pub use context::{
    ActivateEvent, FetchEvent, FetchFuture, FetchHandler, InstallEvent, LifecycleFuture, LifecycleHandler,
    WorkerContext, WorkerControls,
};
pub use host::{EventHost, WorkerState};
pub use worker::{OfflineWorker, WorkerConfig};
