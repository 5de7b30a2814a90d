//! Offline-first caching layer for the Forkful recipe client.
//!
//! The crate has two halves:
//! - [`cache`]: a backend-agnostic engine with network-first fetching,
//!   persisted fallback, and an LRU-bounded cache for detail records
//! - [`api`]: the recipe-domain binding with cache categories, response
//!   envelope decoding, and the loaders the UI consumes
//!
//! Everything degrades: network failures fall back to the persisted store,
//! storage failures degrade to "not cached", and unrecognized response shapes
//! decode to empty collections. Callers never see an error from this layer,
//! only an `is_offline` flag.

pub mod api;
pub mod cache;

pub use api::{CachedRecipeApi, Loaded};
pub use cache::{
  CacheCategory, CacheStats, DetailCache, FetchOptions, FetchResult, KeyValueStore, MemoryStore,
  NoopStore, SqliteStore, UnifiedCache,
};
