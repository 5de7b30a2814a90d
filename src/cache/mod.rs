//! Generic caching layer for data persistence and offline support.
//!
//! This module is backend-agnostic. It provides:
//! - A network-first fetch engine with persisted fallback and offline
//!   reporting (`UnifiedCache`)
//! - An LRU-bounded, expiring cache for detail records (`DetailCache`)
//! - A pluggable string key-value store with SQLite, in-memory, and no-op
//!   implementations

mod category;
mod detail;
mod engine;
mod entry;
mod store;

pub use category::CacheCategory;
pub use detail::{CacheStats, DetailCache, MAX_RECIPES};
pub use engine::{FetchOptions, FetchResult, UnifiedCache};
pub use entry::{CacheEntry, IndexItem};
pub use store::{KeyValueStore, MemoryStore, NoopStore, SqliteStore};
