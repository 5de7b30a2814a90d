//! Fixed registry of cache categories.

use chrono::Duration;

/// Families of cached entities.
///
/// Each category namespaces its storage keys and may carry its own expiry
/// policy. Using an enum makes an unknown category unrepresentable, so
/// callers cannot address a namespace that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
  /// Collections owned by the signed-in user
  UserCollections,
  /// A single collection's metadata
  CollectionDetail,
  /// Recipes inside a collection
  CollectionRecipes,
  /// Recipes authored by a user
  UserRecipes,
  /// Full recipe detail records (LRU-bounded, see `DetailCache`)
  RecipeDetail,
}

impl CacheCategory {
  /// Stable namespace prefix used in storage keys.
  pub fn name(&self) -> &'static str {
    match self {
      Self::UserCollections => "USER_COLLECTIONS",
      Self::CollectionDetail => "COLLECTION_DETAIL",
      Self::CollectionRecipes => "COLLECTION_RECIPES",
      Self::UserRecipes => "USER_RECIPES",
      Self::RecipeDetail => "RECIPE_DETAIL",
    }
  }

  /// Storage key for an entity in this category.
  pub fn storage_key(&self, id: &str) -> String {
    format!("{}_{}", self.name(), id)
  }

  /// Expiry window for direct cache reads.
  ///
  /// `None` means entries in this category never expire on read; list
  /// categories are refreshed network-first anyway, so only detail records
  /// carry a window.
  pub fn ttl(&self) -> Option<Duration> {
    match self {
      Self::RecipeDetail => Some(Duration::days(7)),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn storage_keys_are_namespaced_per_category() {
    let id = "42";
    let keys: Vec<String> = [
      CacheCategory::UserCollections,
      CacheCategory::CollectionDetail,
      CacheCategory::CollectionRecipes,
      CacheCategory::UserRecipes,
      CacheCategory::RecipeDetail,
    ]
    .iter()
    .map(|c| c.storage_key(id))
    .collect();

    assert_eq!(keys[0], "USER_COLLECTIONS_42");
    assert_eq!(keys[4], "RECIPE_DETAIL_42");

    // Same id never collides across categories
    let unique: std::collections::HashSet<&String> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());
  }

  #[test]
  fn only_detail_records_expire_on_read() {
    assert_eq!(CacheCategory::RecipeDetail.ttl(), Some(Duration::days(7)));
    assert_eq!(CacheCategory::UserCollections.ttl(), None);
    assert_eq!(CacheCategory::CollectionRecipes.ttl(), None);
  }
}
