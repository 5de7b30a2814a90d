//! End-to-end exercises of the cache layer through the public API.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use forkful_cache::{CachedRecipeApi, MemoryStore, SqliteStore};

fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .try_init();
}

fn recipes_envelope(ids: &[&str]) -> Value {
  let items: Vec<Value> = ids
    .iter()
    .map(|id| json!({"id": id, "title": format!("Recipe {id}")}))
    .collect();
  json!({"data": {"content": items}})
}

#[tokio::test]
async fn session_survives_going_offline() {
  init_tracing();
  let api = CachedRecipeApi::new(MemoryStore::new());

  // Online: lists load from the network and land in the cache
  let online = api
    .load_user_recipes("u1", || async { Ok(recipes_envelope(&["r1", "r2"])) }, false)
    .await;
  assert_eq!(online.data.len(), 2);
  assert!(!online.is_offline);

  let detail = api
    .load_recipe_detail(
      "r1",
      || async { Ok(json!({"id": "r1", "title": "Recipe r1", "steps": ["mix"]})) },
      false,
    )
    .await;
  assert!(detail.data.is_some());

  // Offline: every load keeps working from the persisted store
  let offline_list = api
    .load_user_recipes("u1", || async { Err(eyre!("no route to host")) }, false)
    .await;
  assert_eq!(offline_list.data.len(), 2);
  assert!(offline_list.is_offline);

  let offline_detail = api
    .load_recipe_detail("r1", || async { Err(eyre!("no route to host")) }, false)
    .await;
  assert_eq!(offline_detail.data.unwrap().steps, vec!["mix".to_string()]);
}

#[tokio::test]
async fn detail_cache_bound_holds_across_a_browsing_session() {
  let api = CachedRecipeApi::new(MemoryStore::new());
  let fetches = Arc::new(AtomicUsize::new(0));

  // Browse 25 distinct recipes
  for i in 1..=25 {
    let id = format!("r{i}");
    let fetches = Arc::clone(&fetches);
    let payload = json!({"id": id.clone(), "title": format!("Recipe {id}")});
    api
      .load_recipe_detail(
        &id,
        move || async move {
          fetches.fetch_add(1, Ordering::SeqCst);
          Ok(payload)
        },
        false,
      )
      .await;
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
  }

  assert_eq!(fetches.load(Ordering::SeqCst), 25);

  let ids = api.details().get_cached_recipe_ids().await;
  assert_eq!(ids.len(), 20);
  assert!(!ids.contains(&"r1".to_string()));
  assert!(ids.contains(&"r25".to_string()));

  // Revisiting a surviving recipe is a cache hit, no network
  let revisit = api
    .load_recipe_detail("r25", || async { Err(eyre!("should not fetch")) }, false)
    .await;
  assert!(revisit.data.is_some());
  assert!(!revisit.is_offline);

  let stats = api.details().get_cache_stats().await;
  assert_eq!(stats.total_entries, 20);
  assert!(stats.approx_bytes > 0);
}

#[tokio::test]
async fn sqlite_backed_api_round_trips() -> Result<()> {
  let api = CachedRecipeApi::new(SqliteStore::open_in_memory()?);

  api
    .load_collection_recipes("c1", || async { Ok(recipes_envelope(&["r9"])) }, false)
    .await;

  let offline = api
    .load_collection_recipes("c1", || async { Err(eyre!("airplane mode")) }, false)
    .await;
  assert_eq!(offline.data.len(), 1);
  assert_eq!(offline.data[0].id, "r9");
  assert!(offline.is_offline);

  Ok(())
}

#[tokio::test]
async fn force_refresh_replaces_cached_lists() {
  let api = CachedRecipeApi::new(MemoryStore::new());

  api
    .load_user_collections(
      "u1",
      || async { Ok(json!([{"id": "c1", "name": "Old name"}])) },
      false,
    )
    .await;

  api
    .load_user_collections(
      "u1",
      || async { Ok(json!([{"id": "c1", "name": "New name"}])) },
      true,
    )
    .await;

  let offline = api
    .load_user_collections("u1", || async { Err(eyre!("down")) }, false)
    .await;
  assert_eq!(offline.data[0].name, "New name");
}
