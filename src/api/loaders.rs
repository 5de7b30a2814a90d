//! Category-bound loaders pairing the unified cache with envelope decoding.
//!
//! Each loader fixes a cache category and a payload type; callers supply the
//! actual network call and get decoded domain types back with offline state
//! attached. The raw JSON envelope is what gets cached, so a fallback read
//! decodes exactly the way a fresh response does.

use color_eyre::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::cache::{CacheCategory, DetailCache, FetchOptions, KeyValueStore, UnifiedCache};

use super::envelope;
use super::types::{Collection, RecipeDetail, RecipeSummary};

/// Decoded data plus the offline flag surfaced to the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
  pub data: T,
  pub is_offline: bool,
}

/// Cached facade over the recipe backend.
///
/// Wraps the unified engine and the LRU detail cache behind per-category load
/// methods, the same way the UI consumes them. List and collection reads go
/// through the engine; full recipe records go through the bounded detail
/// cache.
pub struct CachedRecipeApi<S: KeyValueStore> {
  cache: UnifiedCache<S>,
  details: DetailCache<S>,
}

impl<S: KeyValueStore> CachedRecipeApi<S> {
  pub fn new(store: S) -> Self {
    Self::shared(Arc::new(store))
  }

  pub fn shared(store: Arc<S>) -> Self {
    Self {
      cache: UnifiedCache::shared(Arc::clone(&store)),
      details: DetailCache::shared(store),
    }
  }

  /// Access the underlying engine (e.g. for explicit invalidation).
  pub fn cache(&self) -> &UnifiedCache<S> {
    &self.cache
  }

  /// Access the underlying detail cache.
  pub fn details(&self) -> &DetailCache<S> {
    &self.details
  }

  /// Load the signed-in user's collections.
  pub async fn load_user_collections<F, Fut>(
    &self,
    user_id: &str,
    fetcher: F,
    force_refresh: bool,
  ) -> Loaded<Vec<Collection>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
  {
    self
      .load_list(CacheCategory::UserCollections, user_id, fetcher, force_refresh)
      .await
  }

  /// Load a single collection's metadata.
  pub async fn load_collection_detail<F, Fut>(
    &self,
    collection_id: &str,
    fetcher: F,
    force_refresh: bool,
  ) -> Loaded<Option<Collection>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
  {
    self
      .load_item(
        CacheCategory::CollectionDetail,
        collection_id,
        fetcher,
        force_refresh,
      )
      .await
  }

  /// Load the recipes inside a collection.
  pub async fn load_collection_recipes<F, Fut>(
    &self,
    collection_id: &str,
    fetcher: F,
    force_refresh: bool,
  ) -> Loaded<Vec<RecipeSummary>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
  {
    self
      .load_list(
        CacheCategory::CollectionRecipes,
        collection_id,
        fetcher,
        force_refresh,
      )
      .await
  }

  /// Load the recipes authored by a user.
  pub async fn load_user_recipes<F, Fut>(
    &self,
    user_id: &str,
    fetcher: F,
    force_refresh: bool,
  ) -> Loaded<Vec<RecipeSummary>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
  {
    self
      .load_list(CacheCategory::UserRecipes, user_id, fetcher, force_refresh)
      .await
  }

  /// Load a full recipe through the LRU-bounded detail cache.
  ///
  /// Read-through on hit (which bumps the record's recency), cache-on-fetch
  /// on miss, and offline fallback serving whatever survives the LRU bound.
  pub async fn load_recipe_detail<F, Fut>(
    &self,
    recipe_id: &str,
    fetcher: F,
    force_refresh: bool,
  ) -> Loaded<Option<RecipeDetail>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
  {
    if !force_refresh {
      if let Some(found) = self
        .details
        .get_cached_recipe_detail::<RecipeDetail>(recipe_id)
        .await
      {
        return Loaded {
          data: Some(found),
          is_offline: false,
        };
      }
    }

    match fetcher().await {
      Ok(raw) => {
        let decoded = envelope::decode_item::<RecipeDetail>(&raw);
        if let Some(detail) = &decoded {
          self.details.cache_recipe_detail(recipe_id, detail).await;
        }
        Loaded {
          data: decoded,
          is_offline: false,
        }
      }
      Err(_) => {
        let fallback = self
          .details
          .get_cached_recipe_detail::<RecipeDetail>(recipe_id)
          .await;
        Loaded {
          data: fallback,
          is_offline: true,
        }
      }
    }
  }

  async fn load_list<T, F, Fut>(
    &self,
    category: CacheCategory,
    id: &str,
    fetcher: F,
    force_refresh: bool,
  ) -> Loaded<Vec<T>>
  where
    T: DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
  {
    let result = self
      .cache
      .fetch_with_cache::<Value, _, _>(category, fetcher, Self::options(id, force_refresh))
      .await;

    let mut data = result
      .data
      .as_ref()
      .map(envelope::decode_list)
      .unwrap_or_default();

    // The engine already fell back to the store internally; this second read
    // mirrors the shipped client, which retries the cache once more from the
    // caller's side when it comes back empty-handed offline.
    if data.is_empty() && result.is_offline {
      if let Some(raw) = self.cache.get_from_cache::<Value>(category, id).await {
        data = envelope::decode_list(&raw);
      }
    }

    Loaded {
      data,
      is_offline: result.is_offline,
    }
  }

  async fn load_item<T, F, Fut>(
    &self,
    category: CacheCategory,
    id: &str,
    fetcher: F,
    force_refresh: bool,
  ) -> Loaded<Option<T>>
  where
    T: DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
  {
    let result = self
      .cache
      .fetch_with_cache::<Value, _, _>(category, fetcher, Self::options(id, force_refresh))
      .await;

    let mut data = result.data.as_ref().and_then(envelope::decode_item);

    if data.is_none() && result.is_offline {
      if let Some(raw) = self.cache.get_from_cache::<Value>(category, id).await {
        data = envelope::decode_item(&raw);
      }
    }

    Loaded {
      data,
      is_offline: result.is_offline,
    }
  }

  fn options(id: &str, force_refresh: bool) -> FetchOptions {
    if force_refresh {
      FetchOptions::refresh(id)
    } else {
      FetchOptions::new(id)
    }
  }
}

impl<S: KeyValueStore> Clone for CachedRecipeApi<S> {
  fn clone(&self) -> Self {
    Self {
      cache: self.cache.clone(),
      details: self.details.clone(),
    }
  }
}
