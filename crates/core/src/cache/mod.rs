//! SQLite-backed cache storage for response snapshots.
//!
//! Mirrors the host cache-storage model: a set of named stores (one per
//! version tag), each mapping request keys to full responses. Access is
//! async via tokio-rusqlite. It supports:
//!
//! - Request-addressed entries using SHA-256 keys
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Store enumeration and deletion for version garbage collection

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod storage;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::CacheStore;
