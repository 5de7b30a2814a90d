//! LRU-bounded cache for full recipe detail records.
//!
//! Detail records are large and read one at a time, so they get their own
//! policy: a hard cap on the number of cached records with
//! least-recently-accessed eviction, plus a fixed expiry window. The ordering
//! lives in a single persisted index value under [`INDEX_KEY`].

use color_eyre::{eyre::eyre, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::category::CacheCategory;
use super::entry::{self, CacheEntry, IndexItem};
use super::store::KeyValueStore;

/// Default cap on cached detail records.
pub const MAX_RECIPES: usize = 20;

/// Default expiry window, in days.
const EXPIRY_DAYS: i64 = 7;

/// Storage key holding the LRU index.
const INDEX_KEY: &str = "RECIPE_DETAIL_INDEX";

/// Aggregate statistics over the detail cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
  /// Number of records reachable through the index.
  pub total_entries: usize,
  /// Sum of serialized record sizes, in bytes.
  pub approx_bytes: usize,
  /// Oldest write timestamp across records, epoch milliseconds.
  pub oldest_timestamp: Option<i64>,
}

/// Bounded detail-record cache over a shared key-value store.
///
/// Every operation swallows and logs failures internally; a corrupt or
/// missing index degrades to "not cached" rather than erroring. No operation
/// is retried.
pub struct DetailCache<S: KeyValueStore> {
  store: Arc<S>,
  max_entries: usize,
  expiry: chrono::Duration,
}

impl<S: KeyValueStore> DetailCache<S> {
  /// Create a detail cache with the default cap and expiry.
  pub fn new(store: S) -> Self {
    Self::shared(Arc::new(store))
  }

  /// Create a detail cache over a store shared with other components.
  pub fn shared(store: Arc<S>) -> Self {
    Self {
      store,
      max_entries: MAX_RECIPES,
      expiry: chrono::Duration::days(EXPIRY_DAYS),
    }
  }

  /// Set the entry cap.
  pub fn with_max_entries(mut self, max_entries: usize) -> Self {
    self.max_entries = max_entries;
    self
  }

  /// Set the expiry window.
  pub fn with_expiry(mut self, expiry: chrono::Duration) -> Self {
    self.expiry = expiry;
    self
  }

  fn entry_key(&self, id: &str) -> String {
    CacheCategory::RecipeDetail.storage_key(id)
  }

  /// Cache a detail record, evicting least-recently-accessed records past
  /// the cap.
  pub async fn cache_recipe_detail<T: Serialize>(&self, id: &str, data: &T) {
    if let Err(e) = self.try_cache(id, data).await {
      warn!("failed to cache recipe detail {id}: {e}");
    }
  }

  /// Read a detail record.
  ///
  /// Expired records are treated as misses and deleted along with their
  /// index row. A hit bumps the record to the front of the LRU ordering and
  /// persists the bump.
  pub async fn get_cached_recipe_detail<T: DeserializeOwned>(&self, id: &str) -> Option<T> {
    match self.try_get(id).await {
      Ok(found) => found,
      Err(e) => {
        warn!("failed to read recipe detail {id}: {e}");
        None
      }
    }
  }

  /// Delete a detail record and its index row.
  pub async fn remove_cached_recipe(&self, id: &str) {
    if let Err(e) = self.try_remove(id).await {
      warn!("failed to remove recipe detail {id}: {e}");
    }
  }

  /// Delete every indexed record and the index itself. Idempotent.
  pub async fn clear_all_cache(&self) {
    if let Err(e) = self.try_clear().await {
      warn!("failed to clear recipe detail cache: {e}");
    }
  }

  /// Ids currently tracked by the LRU index, most recently accessed first.
  /// Expiry is not validated here.
  pub async fn get_cached_recipe_ids(&self) -> Vec<String> {
    match self.load_index().await {
      Ok(index) => index.into_iter().map(|item| item.recipe_id).collect(),
      Err(e) => {
        warn!("failed to load recipe detail index: {e}");
        Vec::new()
      }
    }
  }

  /// Whether a record exists under the id's storage key.
  ///
  /// This is a pure presence check: an expired record that has not been read
  /// (and therefore not evicted) yet still counts as cached, unlike
  /// [`Self::get_cached_recipe_detail`].
  pub async fn is_recipe_cached(&self, id: &str) -> bool {
    match self.store.get(&self.entry_key(id)).await {
      Ok(found) => found.is_some(),
      Err(e) => {
        warn!("failed to probe recipe detail {id}: {e}");
        false
      }
    }
  }

  /// Scan every cached record and aggregate counts, approximate size, and
  /// the oldest write timestamp. O(n) in the number of records.
  pub async fn get_cache_stats(&self) -> CacheStats {
    match self.try_stats().await {
      Ok(stats) => stats,
      Err(e) => {
        warn!("failed to collect recipe detail cache stats: {e}");
        CacheStats::default()
      }
    }
  }

  async fn try_cache<T: Serialize>(&self, id: &str, data: &T) -> Result<()> {
    let entry = CacheEntry::new(data);
    self.store.set(&self.entry_key(id), &entry.encode()?).await?;
    self.update_cache_index(id).await
  }

  async fn try_get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
    let key = self.entry_key(id);
    let raw = match self.store.get(&key).await? {
      Some(raw) => raw,
      None => return Ok(None),
    };
    let mut entry: CacheEntry<Value> = CacheEntry::decode(&raw)?;

    if entry.age_millis() > self.expiry.num_milliseconds() {
      debug!("recipe detail {id} expired, evicting");
      self.try_remove(id).await?;
      return Ok(None);
    }

    entry.touch();
    self.store.set(&key, &entry.encode()?).await?;
    self.update_cache_index(id).await?;

    let data = serde_json::from_value(entry.data)
      .map_err(|e| eyre!("Failed to deserialize recipe detail {}: {}", id, e))?;
    Ok(Some(data))
  }

  /// Upsert `id` with the current time, re-sort, and evict past the cap.
  async fn update_cache_index(&self, id: &str) -> Result<()> {
    let mut index = self.load_index().await?;

    let now = entry::now_millis();
    match index.iter_mut().find(|item| item.recipe_id == id) {
      Some(item) => item.last_accessed = now,
      None => index.push(IndexItem {
        recipe_id: id.to_string(),
        last_accessed: now,
      }),
    }

    // Stable sort: rows sharing a millisecond keep their prior order, so the
    // first-inserted one survives eviction preferentially.
    index.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));

    if index.len() > self.max_entries {
      for evicted in index.split_off(self.max_entries) {
        self
          .store
          .remove(&self.entry_key(&evicted.recipe_id))
          .await?;
        debug!("evicted recipe detail {}", evicted.recipe_id);
      }
    }

    self.store.set(INDEX_KEY, &entry::encode_index(&index)?).await
  }

  async fn try_remove(&self, id: &str) -> Result<()> {
    self.store.remove(&self.entry_key(id)).await?;
    let mut index = self.load_index().await?;
    index.retain(|item| item.recipe_id != id);
    self.store.set(INDEX_KEY, &entry::encode_index(&index)?).await
  }

  async fn try_clear(&self) -> Result<()> {
    for item in self.load_index().await? {
      self.store.remove(&self.entry_key(&item.recipe_id)).await?;
    }
    self.store.remove(INDEX_KEY).await
  }

  async fn try_stats(&self) -> Result<CacheStats> {
    let mut stats = CacheStats::default();

    for item in self.load_index().await? {
      // Index rows without a payload (interrupted multi-key write) are skipped
      let raw = match self.store.get(&self.entry_key(&item.recipe_id)).await? {
        Some(raw) => raw,
        None => continue,
      };
      let entry: CacheEntry<Value> = CacheEntry::decode(&raw)?;

      stats.total_entries += 1;
      stats.approx_bytes += raw.len();
      stats.oldest_timestamp = Some(match stats.oldest_timestamp {
        Some(oldest) => oldest.min(entry.timestamp),
        None => entry.timestamp,
      });
    }

    Ok(stats)
  }

  async fn load_index(&self) -> Result<Vec<IndexItem>> {
    match self.store.get(INDEX_KEY).await? {
      Some(raw) => match entry::decode_index(&raw) {
        Ok(index) => Ok(index),
        Err(e) => {
          // A corrupt index degrades to empty rather than poisoning every op
          warn!("corrupt recipe detail index, resetting: {e}");
          Ok(Vec::new())
        }
      },
      None => Ok(Vec::new()),
    }
  }
}

impl<S: KeyValueStore> Clone for DetailCache<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      max_entries: self.max_entries,
      expiry: self.expiry,
    }
  }
}
