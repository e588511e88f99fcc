//! Core types and shared functionality for shelter.
//!
//! This crate provides:
//! - Request/response snapshots exchanged between the worker and the network
//! - Versioned cache storage with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod message;

pub use cache::{CacheDb, CacheStore};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use message::{Request, Response, ResponseType};
