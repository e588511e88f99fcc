//! Network access for shelter.
//!
//! This crate provides the [`Network`] seam the worker fetches through, its
//! reqwest-backed implementation, and a scripted in-memory double for tests.

pub mod fetch;

pub use fetch::mock::MockNetwork;
pub use fetch::{FetchConfig, HttpNetwork, Network, UrlError, is_same_origin, resolve, validate_request};
