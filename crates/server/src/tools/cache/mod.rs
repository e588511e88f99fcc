//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting the worker's cache storage.

pub mod list;

pub use list::{CacheListParams, list_impl};
