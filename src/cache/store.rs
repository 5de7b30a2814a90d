//! Key-value storage trait and its SQLite implementation.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::Mutex;

/// Trait for persistent string-keyed storage backends.
///
/// No atomic multi-key operations are assumed; callers must tolerate a crash
/// between related writes (e.g. an index row whose payload is missing).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
  /// Read the value for a key, if present.
  async fn get(&self, key: &str) -> Result<Option<String>>;

  /// Write a value, replacing any existing one.
  async fn set(&self, key: &str, value: &str) -> Result<()>;

  /// Delete a key. Deleting a missing key is not an error.
  async fn remove(&self, key: &str) -> Result<()>;
}

/// Storage implementation that doesn't persist anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStore;

#[async_trait]
impl KeyValueStore for NoopStore {
  async fn get(&self, _key: &str) -> Result<Option<String>> {
    Ok(None) // Always miss
  }

  async fn set(&self, _key: &str, _value: &str) -> Result<()> {
    Ok(()) // Discard
  }

  async fn remove(&self, _key: &str) -> Result<()> {
    Ok(())
  }
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
  map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
  async fn get(&self, key: &str) -> Result<Option<String>> {
    let map = self.map.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(map.get(key).cloned())
  }

  async fn set(&self, key: &str, value: &str) -> Result<()> {
    let mut map = self.map.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    map.insert(key.to_string(), value.to_string());
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<()> {
    let mut map = self.map.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
    map.remove(key);
    Ok(())
  }
}

/// SQLite-based storage implementation.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

/// Schema for the key-value table.
const KV_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_cache (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    written_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SqliteStore {
  /// Open the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open an in-memory database. Used by tests.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("forkful").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(KV_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
  async fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT value FROM kv_cache WHERE key = ?")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let value: Option<String> = stmt.query_row(params![key], |row| row.get(0)).ok();

    Ok(value)
  }

  async fn set(&self, key: &str, value: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO kv_cache (key, value, written_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to write cache value: {}", e))?;

    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM kv_cache WHERE key = ?", params![key])
      .map_err(|e| eyre!("Failed to delete cache value: {}", e))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn memory_store_round_trip() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k").await.unwrap(), None);

    store.set("k", "v1").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some("v1".into()));

    store.set("k", "v2").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some("v2".into()));

    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);

    // Removing a missing key is fine
    store.remove("k").await.unwrap();
  }

  #[tokio::test]
  async fn sqlite_store_round_trip() {
    let store = SqliteStore::open_in_memory().unwrap();

    store.set("USER_RECIPES_7", "{\"data\":[]}").await.unwrap();
    assert_eq!(
      store.get("USER_RECIPES_7").await.unwrap(),
      Some("{\"data\":[]}".into())
    );

    store.remove("USER_RECIPES_7").await.unwrap();
    assert_eq!(store.get("USER_RECIPES_7").await.unwrap(), None);
    store.remove("USER_RECIPES_7").await.unwrap();
  }

  #[tokio::test]
  async fn noop_store_always_misses() {
    let store = NoopStore;
    store.set("k", "v").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
  }
}
