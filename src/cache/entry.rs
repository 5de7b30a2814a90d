//! Wire codec for persisted cache values.
//!
//! Every value in the key-value store is a JSON string. Payload entries are
//! `{"data": <opaque>, "timestamp": <ms>, "lastAccessed": <ms>}`; the LRU
//! index is `[{"recipeId": <id>, "lastAccessed": <ms>}, ...]`.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
  Utc::now().timestamp_millis()
}

/// A cached payload with its write/access metadata.
///
/// `last_accessed` is only meaningful to the LRU-bounded detail cache; the
/// unified engine writes it but never reads it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
  /// The cached payload, opaque to the cache layer.
  pub data: T,
  /// Write time, epoch milliseconds. Refreshed on every successful fetch.
  pub timestamp: i64,
  /// Most recent read or re-write time. Never earlier than `timestamp`.
  #[serde(rename = "lastAccessed")]
  pub last_accessed: i64,
}

impl<T> CacheEntry<T> {
  /// Create a fresh entry; both timestamps are set to now.
  pub fn new(data: T) -> Self {
    let now = now_millis();
    Self {
      data,
      timestamp: now,
      last_accessed: now,
    }
  }

  /// Record an access without touching the write timestamp.
  pub fn touch(&mut self) {
    self.last_accessed = self.last_accessed.max(now_millis());
  }

  /// Age relative to the write time, in milliseconds.
  pub fn age_millis(&self) -> i64 {
    now_millis() - self.timestamp
  }
}

impl<T: Serialize> CacheEntry<T> {
  /// Serialize to the persisted string form.
  pub fn encode(&self) -> Result<String> {
    serde_json::to_string(self).map_err(|e| eyre!("Failed to serialize cache entry: {}", e))
  }
}

impl<T: DeserializeOwned> CacheEntry<T> {
  /// Parse an entry from its persisted string form.
  pub fn decode(raw: &str) -> Result<Self> {
    serde_json::from_str(raw).map_err(|e| eyre!("Failed to parse cache entry: {}", e))
  }
}

/// One row of the persisted LRU index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexItem {
  #[serde(rename = "recipeId")]
  pub recipe_id: String,
  #[serde(rename = "lastAccessed")]
  pub last_accessed: i64,
}

/// Serialize the LRU index to its persisted string form.
pub fn encode_index(items: &[IndexItem]) -> Result<String> {
  serde_json::to_string(items).map_err(|e| eyre!("Failed to serialize cache index: {}", e))
}

/// Parse the LRU index from its persisted string form.
pub fn decode_index(raw: &str) -> Result<Vec<IndexItem>> {
  serde_json::from_str(raw).map_err(|e| eyre!("Failed to parse cache index: {}", e))
}
