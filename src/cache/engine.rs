//! Unified cache engine: network-first fetch with persisted fallback.

use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use super::category::CacheCategory;
use super::entry::CacheEntry;
use super::store::KeyValueStore;

/// Result of a [`UnifiedCache::fetch_with_cache`] call.
///
/// Invariants: `is_offline` implies `from_cache`; a successful network fetch
/// yields `from_cache == false` and `is_offline == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult<T> {
  pub data: Option<T>,
  pub from_cache: bool,
  pub is_offline: bool,
}

impl<T> FetchResult<T> {
  fn from_network(data: T) -> Self {
    Self {
      data: Some(data),
      from_cache: false,
      is_offline: false,
    }
  }

  fn from_fallback(data: T) -> Self {
    Self {
      data: Some(data),
      from_cache: true,
      is_offline: true,
    }
  }

  fn fresh_hit(data: T) -> Self {
    Self {
      data: Some(data),
      from_cache: true,
      is_offline: false,
    }
  }

  fn miss() -> Self {
    Self {
      data: None,
      from_cache: true,
      is_offline: true,
    }
  }
}

/// Options for a [`UnifiedCache::fetch_with_cache`] call.
#[derive(Debug, Clone)]
pub struct FetchOptions {
  /// Entity id within the category. Must be non-empty.
  pub id: String,
  /// Skip the fresh-cache short-circuit and always hit the network.
  pub force_refresh: bool,
}

impl FetchOptions {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      force_refresh: false,
    }
  }

  pub fn refresh(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      force_refresh: true,
    }
  }
}

/// Network-first cache engine with offline fallback.
///
/// Sits between the app's data loaders and the REST client: fetches go to the
/// network when possible, fall back to the persisted store when the network is
/// unavailable, and report where the data came from. Nothing in here is fatal;
/// storage failures degrade to "not cached" and network failures to offline
/// mode.
pub struct UnifiedCache<S: KeyValueStore> {
  store: Arc<S>,
  /// Hard cap on how long a single network fetch may run.
  network_timeout: Duration,
  /// Per-key generation counters. Only the most recently issued request for a
  /// key may commit its result, so a slow stale response cannot overwrite a
  /// fresher one.
  generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl<S: KeyValueStore> UnifiedCache<S> {
  /// Create an engine over the given store.
  pub fn new(store: S) -> Self {
    Self::shared(Arc::new(store))
  }

  /// Create an engine over a store shared with other components.
  pub fn shared(store: Arc<S>) -> Self {
    Self {
      store,
      network_timeout: Duration::from_secs(30),
      generations: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Set the network timeout.
  pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
    self.network_timeout = timeout;
    self
  }

  /// Fetch an entity network-first, falling back to the persisted cache.
  ///
  /// 1. If the category carries an expiry window, the caller did not force a
  ///    refresh, and a non-expired entry exists, return it immediately.
  /// 2. Otherwise run the fetcher under the network timeout. On success the
  ///    result is committed to the store (unless a later request for the same
  ///    key has already been issued) and returned as fresh.
  /// 3. On failure or timeout, serve whatever the store holds for the key,
  ///    stale or not, flagged as offline. With no usable entry the result is
  ///    an offline miss with no data.
  ///
  /// Never returns an error; every failure mode degrades.
  pub async fn fetch_with_cache<T, F, Fut>(
    &self,
    category: CacheCategory,
    fetcher: F,
    options: FetchOptions,
  ) -> FetchResult<T>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    assert!(
      !options.id.is_empty(),
      "fetch_with_cache requires a non-empty entity id"
    );
    let key = category.storage_key(&options.id);

    if !options.force_refresh {
      if let Some(ttl) = category.ttl() {
        if let Some(entry) = self.read_entry::<T>(&key).await {
          if entry.age_millis() <= ttl.num_milliseconds() {
            return FetchResult::fresh_hit(entry.data);
          }
        }
      }
    }

    let token = self.next_generation(&key);

    match tokio::time::timeout(self.network_timeout, fetcher()).await {
      Ok(Ok(data)) => {
        if self.is_current_generation(&key, token) {
          if let Err(e) = self.write_entry(&key, &data).await {
            warn!("failed to persist fetched value for {key}: {e}");
          }
        } else {
          debug!("skipping cache commit for superseded request on {key}");
        }
        FetchResult::from_network(data)
      }
      Ok(Err(e)) => {
        debug!("network fetch for {key} failed, falling back to cache: {e}");
        self.fallback(&key).await
      }
      Err(_) => {
        debug!("network fetch for {key} timed out, falling back to cache");
        self.fallback(&key).await
      }
    }
  }

  /// Read an entity directly from the cache, honoring the category's expiry
  /// policy. Expired entries are deleted on read and reported as misses.
  pub async fn get_from_cache<T: DeserializeOwned>(
    &self,
    category: CacheCategory,
    id: &str,
  ) -> Option<T> {
    let key = category.storage_key(id);
    let entry = self.read_entry::<T>(&key).await?;

    if let Some(ttl) = category.ttl() {
      if entry.age_millis() > ttl.num_milliseconds() {
        if let Err(e) = self.store.remove(&key).await {
          warn!("failed to delete expired entry {key}: {e}");
        }
        return None;
      }
    }

    Some(entry.data)
  }

  /// Delete an entity from the cache. Best effort; errors are logged.
  pub async fn remove_from_cache(&self, category: CacheCategory, id: &str) {
    let key = category.storage_key(id);
    if let Err(e) = self.store.remove(&key).await {
      warn!("failed to remove cache entry {key}: {e}");
    }
  }

  /// Offline fallback read. Expiry is deliberately ignored here: stale data
  /// beats no data when the network is unavailable.
  async fn fallback<T: DeserializeOwned>(&self, key: &str) -> FetchResult<T> {
    match self.read_entry::<T>(key).await {
      Some(entry) => FetchResult::from_fallback(entry.data),
      None => FetchResult::miss(),
    }
  }

  async fn read_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
    let raw = match self.store.get(key).await {
      Ok(raw) => raw?,
      Err(e) => {
        warn!("cache read failed for {key}: {e}");
        return None;
      }
    };

    match CacheEntry::decode(&raw) {
      Ok(entry) => Some(entry),
      Err(e) => {
        warn!("corrupt cache entry at {key}: {e}");
        None
      }
    }
  }

  async fn write_entry<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
    let entry = CacheEntry::new(data);
    self.store.set(key, &entry.encode()?).await
  }

  fn next_generation(&self, key: &str) -> u64 {
    let mut generations = self
      .generations
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    let counter = generations.entry(key.to_string()).or_insert(0);
    *counter += 1;
    *counter
  }

  fn is_current_generation(&self, key: &str, token: u64) -> bool {
    let generations = self
      .generations
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    generations.get(key).copied() == Some(token)
  }
}

impl<S: KeyValueStore> Clone for UnifiedCache<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      network_timeout: self.network_timeout,
      generations: Arc::clone(&self.generations),
    }
  }
}
